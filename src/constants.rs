//! Compile-time defaults for the heap layout. Most of these are overridable
//! per-instance through [`crate::options::Options`]; the ones that govern the
//! on-heap encoding (`ALLOC_UNIT`, `MAX_INDEX`) are not, since the cell
//! header layout is derived from them.

/// Default size of the backing heap region, in bytes.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Size of one allocation slot, in bytes. The cell header must fit in one.
pub const ALLOC_UNIT: usize = 16;

/// Largest slot offset the 16-bit encoding can address.
pub const MAX_INDEX: u16 = u16::MAX;

/// Byte written into newly allocated, unpoisoned-by-the-client payloads.
pub const POISON_BYTE: u8 = 0x7F;

/// Page size used to round the stack-top hint up to a safe upper bound.
pub const PAGE_SIZE: usize = 4096;
