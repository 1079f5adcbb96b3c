//! Storage layer
//!
//! # Architecture
//!
//! ```text
//! UserStore
//!   ├─→ IdentityIndex (one lock)
//!   │     ├─→ uid  → SlotRef
//!   │     ├─→ name → uid
//!   │     └─→ next uid counter
//!   └─→ SlabAllocator (one lock)
//!         └─→ Block[] → Record { Mutex<RecordFields> }
//! ```
//!
//! `create` reserves a name and uid, takes a slot from the slab, binds the
//! two and fills in the fields under the record's own lock. `update` and
//! `get` resolve the uid through the index and then work on the record
//! under its lock only, so unrelated records never contend.

pub mod index;
pub mod record;
pub mod slab;
pub mod store;

pub use index::{IdentityIndex, Reservation};
pub use record::{Credential, NewUser, Record, RecordFields, Uid, UpdateRequest, UserView};
pub use slab::{SlabAllocator, SlotId, SlotRef};
pub use store::{StoreConfig, StoreStats, UserStore, DEFAULT_BASE_UID};
