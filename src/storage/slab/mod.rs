//! Slab Allocator
//!
//! Append-only arena of fixed-size record blocks.
//!
//! # Architecture
//!
//! ```text
//! SlabAllocator (lock: next free slot only)
//!   ├─→ Block 0 [r0 r1 r2 ... r1023]   ← full, never touched again
//!   ├─→ Block 1 [r0 r1 r2 ... r1023]   ← full
//!   └─→ Block 2 [r0 r1 ·  ·  ...    ]  ← next = (2, 2)
//! ```
//!
//! Growth only pushes a new block. A `SlotRef` shares ownership of its
//! block, so a handed-out record is never moved or freed while referenced.

pub mod allocator;
pub mod slot;

pub use allocator::{SlabAllocator, SlabStats, DEFAULT_BLOCK_CAPACITY};
pub use slot::{SlotId, SlotRef};
