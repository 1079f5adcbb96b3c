//! Identity index: UID → record slot, name → UID, and the UID counter
//!
//! One coarse lock guards both maps and the counter. Critical sections
//! are single map operations; no record fields are touched under it.

use super::record::{RecordFields, Uid};
use super::slab::SlotRef;
use crate::error::{Error, Result};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use tracing::{debug, info};

/// A claimed name and identity, not yet bound to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub uid: Uid,
    generation: u64,
}

pub struct IdentityIndex {
    base_uid: Uid,
    state: Mutex<IndexState>,
}

struct IndexState {
    records: HashMap<Uid, SlotRef>,
    names: HashMap<String, Uid>,
    next_uid: Uid,
    /// Bumped by every reset
    generation: u64,
}

impl IndexState {
    fn fresh(base_uid: Uid, generation: u64) -> Self {
        Self {
            records: HashMap::new(),
            names: HashMap::new(),
            next_uid: base_uid,
            generation,
        }
    }
}

impl IdentityIndex {
    pub fn new(base_uid: Uid) -> Self {
        Self {
            base_uid,
            state: Mutex::new(IndexState::fresh(base_uid, 0)),
        }
    }

    /// Claim `name` and the next identity
    pub fn reserve(&self, name: &str) -> Result<Reservation> {
        let mut state = self.state.lock();
        if state.names.contains_key(name) {
            return Err(Error::Conflict("Name already reserved".to_string()));
        }

        let uid = state.next_uid;
        state.next_uid = uid
            .checked_add(1)
            .ok_or_else(|| Error::Conflict("UID space exhausted".to_string()))?;
        state.names.insert(name.to_string(), uid);

        debug!(uid, name, "Reserved identity");
        Ok(Reservation {
            uid,
            generation: state.generation,
        })
    }

    /// Publish the uid → slot mapping and hand back the record locked.
    ///
    /// The record lock is taken before the index lock is released, so any
    /// reader resolving the new uid blocks until the caller finishes
    /// initializing the fields. The slot is unreachable until this insert,
    /// so acquiring its lock here never waits.
    pub fn bind<'r>(
        &self,
        reservation: &Reservation,
        slot: &'r SlotRef,
    ) -> Result<MutexGuard<'r, RecordFields>> {
        let mut state = self.state.lock();
        if state.generation != reservation.generation {
            return Err(Error::Conflict("Name reservation lost to reset".to_string()));
        }

        state.records.insert(reservation.uid, slot.clone());
        let fields = slot.lock();
        drop(state);

        debug!(uid = reservation.uid, slot = %slot.id(), "Bound identity");
        Ok(fields)
    }

    pub fn resolve(&self, uid: Uid) -> Result<SlotRef> {
        self.state
            .lock()
            .records
            .get(&uid)
            .cloned()
            .ok_or_else(|| Error::NotFound("UID not found".to_string()))
    }

    /// Name → identity. Only bound identities are reported.
    pub fn lookup(&self, name: &str) -> Result<Uid> {
        let state = self.state.lock();
        state
            .names
            .get(name)
            .copied()
            .filter(|uid| state.records.contains_key(uid))
            .ok_or_else(|| Error::NotFound("Name not found".to_string()))
    }

    /// Drop every mapping and restart the counter at the base value.
    /// Records already handed out are left alone.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        let dropped = state.records.len();
        *state = IndexState::fresh(self.base_uid, generation);
        info!(dropped, generation, "Identity index reset");
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.lock();
        IndexStats {
            records: state.records.len(),
            names: state.names.len(),
            next_uid: state.next_uid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub records: usize,
    pub names: usize,
    pub next_uid: Uid,
}
