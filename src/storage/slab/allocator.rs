//! Block allocator implementation

use super::slot::{Block, SlotId, SlotRef};
use crate::error::{Error, Result};
use crate::storage::record::Record;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Default number of record slots per block
pub const DEFAULT_BLOCK_CAPACITY: usize = 1024;

/// Append-only slab allocator for records
///
/// Hands out slots from the newest block and appends a fresh block when
/// that one fills up. Existing blocks are never resized, moved or reused,
/// so every `SlotRef` stays valid for the life of the process.
pub struct SlabAllocator {
    /// Slots per block
    block_capacity: usize,
    /// Bookkeeping, guarded by the allocator lock
    state: Mutex<AllocState>,
}

struct AllocState {
    blocks: Vec<Block>,
    /// Next free slot
    next: SlotId,
}

impl SlabAllocator {
    /// Create a new allocator
    ///
    /// # Arguments
    /// * `block_capacity` - Slots per block (must be non-zero)
    pub fn new(block_capacity: usize) -> Result<Self> {
        if block_capacity == 0 || u32::try_from(block_capacity).is_err() {
            return Err(Error::InvalidArgument(format!(
                "Invalid block capacity: {}",
                block_capacity
            )));
        }

        debug!("Initializing slab allocator with {} slots per block", block_capacity);
        Ok(Self::with_capacity(block_capacity))
    }

    fn with_capacity(block_capacity: usize) -> Self {
        Self {
            block_capacity,
            state: Mutex::new(AllocState {
                blocks: Vec::new(),
                next: SlotId::default(),
            }),
        }
    }

    /// Allocate a zero-valued record slot
    ///
    /// Never fails; a new block is appended when the current one is full.
    /// The lock covers only the slot bookkeeping.
    pub fn allocate(&self) -> SlotRef {
        let mut state = self.state.lock();
        let id = state.next;

        if id.slot == 0 {
            let block: Block = (0..self.block_capacity).map(|_| Record::default()).collect();
            state.blocks.push(block);
            info!(blocks = state.blocks.len(), "Appended slab block");
        }

        let slot = SlotRef::new(state.blocks[id.block as usize].clone(), id);

        state.next = if id.slot as usize + 1 == self.block_capacity {
            SlotId::new(id.block + 1, 0)
        } else {
            SlotId::new(id.block, id.slot + 1)
        };

        debug!("Allocated {}", id);
        slot
    }

    /// Get statistics about the allocator
    pub fn stats(&self) -> SlabStats {
        let state = self.state.lock();
        let blocks = state.blocks.len();
        let slots_issued =
            state.next.block as u64 * self.block_capacity as u64 + state.next.slot as u64;

        SlabStats {
            blocks,
            block_capacity: self.block_capacity,
            slots_issued,
        }
    }
}

impl Default for SlabAllocator {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BLOCK_CAPACITY)
    }
}

/// Statistics for the slab allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlabStats {
    pub blocks: usize,
    pub block_capacity: usize,
    pub slots_issued: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            SlabAllocator::new(0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_allocator_walks_slots_then_blocks() {
        let allocator = SlabAllocator::new(3).unwrap();

        let ids: Vec<SlotId> = (0..7).map(|_| allocator.allocate().id()).collect();
        assert_eq!(
            ids,
            vec![
                SlotId::new(0, 0),
                SlotId::new(0, 1),
                SlotId::new(0, 2),
                SlotId::new(1, 0),
                SlotId::new(1, 1),
                SlotId::new(1, 2),
                SlotId::new(2, 0),
            ]
        );

        let stats = allocator.stats();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.slots_issued, 7);
    }

    #[test]
    fn test_block_appended_lazily() {
        let allocator = SlabAllocator::new(2).unwrap();
        assert_eq!(allocator.stats().blocks, 0);

        allocator.allocate();
        allocator.allocate();
        // Second block is only created by the third allocation
        assert_eq!(allocator.stats().blocks, 1);

        allocator.allocate();
        assert_eq!(allocator.stats().blocks, 2);
    }

    #[test]
    fn test_issued_slot_address_is_stable_across_growth() {
        let allocator = SlabAllocator::new(4).unwrap();
        let first = allocator.allocate();
        let addr = &*first as *const Record;
        first.lock().name = "pinned".to_string();

        for _ in 0..1000 {
            allocator.allocate();
        }

        assert_eq!(&*first as *const Record, addr);
        assert_eq!(first.lock().name, "pinned");
    }

    #[test]
    fn test_concurrent_allocations_are_unique() {
        let allocator = Arc::new(SlabAllocator::new(16).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                thread::spawn(move || (0..500).map(|_| allocator.allocate().id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<SlotId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 8 * 500);
        assert_eq!(allocator.stats().slots_issued, 8 * 500);
    }
}
