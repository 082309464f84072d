//! Traversal helpers shared by the free list and the used list: both are
//! plain singly-linked chains of cells, they just disagree on ordering.

use crate::constants::ALLOC_UNIT;
use crate::offset::{header_ptr, Offset};

/// Number of blocks on the list rooted at `head`.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`.
pub(crate) unsafe fn len(base: usize, head: Offset) -> usize {
    let mut cur = head;
    let mut n = 0;
    while !cur.is_null() {
        n += 1;
        cur = Offset((*header_ptr(base, cur)).next);
    }
    n
}

/// Total size in bytes of every block on the list rooted at `head`.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`.
pub(crate) unsafe fn total_bytes(base: usize, head: Offset) -> usize {
    let mut cur = head;
    let mut total = 0usize;
    while !cur.is_null() {
        let p = header_ptr(base, cur);
        total += (*p).size as usize * ALLOC_UNIT;
        cur = Offset((*p).next);
    }
    total
}
