//! User store: create, update, get and reset over the slab and the index

use super::index::IdentityIndex;
use super::record::{NewUser, Uid, UpdateRequest, UserView};
use super::slab::{SlabAllocator, DEFAULT_BLOCK_CAPACITY};
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// First identity handed out by a fresh (or freshly reset) store
pub const DEFAULT_BASE_UID: Uid = 1000;

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Record slots per slab block
    pub block_capacity: usize,
    /// First UID issued
    pub base_uid: Uid,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            base_uid: DEFAULT_BASE_UID,
        }
    }
}

/// Concurrent in-memory user store
///
/// Three lock domains, never held in a cycle:
/// - the slab lock, for slot bookkeeping only;
/// - the index lock, for map and counter access only;
/// - one lock per record, for its fields.
///
/// A record lock is acquired while the index lock is held only inside
/// `create`, on a record nobody else can reach yet.
pub struct UserStore {
    config: StoreConfig,
    slab: SlabAllocator,
    index: IdentityIndex,
}

impl UserStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        if config.base_uid == Uid::MAX {
            return Err(Error::InvalidArgument(format!(
                "Invalid base UID: {}",
                config.base_uid
            )));
        }
        let slab = SlabAllocator::new(config.block_capacity)?;
        Ok(Self::assemble(config, slab))
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::assemble(StoreConfig::default(), SlabAllocator::default())
    }

    fn assemble(config: StoreConfig, slab: SlabAllocator) -> Self {
        let index = IdentityIndex::new(config.base_uid);
        info!(
            block_capacity = config.block_capacity,
            base_uid = config.base_uid,
            "User store initialized"
        );
        Self {
            config,
            slab,
            index,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create a user and return its new UID
    pub fn create(&self, user: NewUser) -> Result<Uid> {
        if user.name.is_empty() {
            return Err(Error::Validation("Empty name".to_string()));
        }

        let reservation = self.index.reserve(&user.name)?;
        let slot = self.slab.allocate();

        let mut fields = self.index.bind(&reservation, &slot)?;
        fields.initialize(reservation.uid, user);
        drop(fields);

        debug!(uid = reservation.uid, slot = %slot.id(), "Created user");
        Ok(reservation.uid)
    }

    /// Overwrite the supplied fields of an existing user
    pub fn update(&self, uid: Uid, update: &UpdateRequest) -> Result<()> {
        let slot = self.index.resolve(uid)?;
        slot.mutate(update);
        debug!(uid, "Updated user");
        Ok(())
    }

    /// Snapshot of a user's visible fields
    pub fn get(&self, uid: Uid) -> Result<UserView> {
        let slot = self.index.resolve(uid)?;
        Ok(slot.read())
    }

    /// UID currently bound to `name`
    pub fn lookup(&self, name: &str) -> Result<Uid> {
        self.index.lookup(name)
    }

    /// Forget every user. Slab memory is retained, not reclaimed.
    pub fn reset(&self) {
        self.index.reset();
    }

    pub fn stats(&self) -> StoreStats {
        let index = self.index.stats();
        let slab = self.slab.stats();
        StoreStats {
            records: index.records,
            names: index.names,
            next_uid: index.next_uid,
            blocks: slab.blocks,
            slots_issued: slab.slots_issued,
            block_capacity: slab.block_capacity,
        }
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub records: usize,
    pub names: usize,
    pub next_uid: Uid,
    pub blocks: usize,
    pub slots_issued: u64,
    pub block_capacity: usize,
}
