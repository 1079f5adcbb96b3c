//! Slot addressing for the block allocator

use crate::storage::record::Record;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A fixed-capacity run of record slots. Never resized once created.
pub(crate) type Block = Arc<[Record]>;

/// Location of a slot: which block, and which cell inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SlotId {
    /// Block index (0 = oldest)
    pub block: u32,
    /// Slot offset within the block
    pub slot: u32,
}

impl SlotId {
    /// Create a new slot ID
    pub fn new(block: u32, slot: u32) -> Self {
        Self { block, slot }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot(block={}, slot={})", self.block, self.slot)
    }
}

/// Stable handle to an issued slot.
///
/// Holds a share of the owning block, so the record it points at stays
/// valid for as long as any handle exists, even after the index that
/// handed it out has been reset.
#[derive(Clone)]
pub struct SlotRef {
    block: Block,
    id: SlotId,
}

impl SlotRef {
    pub(crate) fn new(block: Block, id: SlotId) -> Self {
        debug_assert!((id.slot as usize) < block.len());
        Self { block, id }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// True if both handles address the very same record cell
    pub fn same_slot(&self, other: &SlotRef) -> bool {
        std::ptr::eq::<Record>(&**self, &**other)
    }
}

impl Deref for SlotRef {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.block[self.id.slot as usize]
    }
}

impl fmt::Debug for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotRef").field(&self.id).finish()
    }
}
