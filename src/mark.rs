//! Conservative tracing: treat every aligned word in a memory range as a
//! candidate pointer, and follow the ones that land inside a used block.

use log::trace;

use crate::cell::{HEADER_SIZE, MARKED, UNMARKED};
use crate::constants::ALLOC_UNIT;
use crate::offset::{header_ptr, to_addr, Offset};
use crate::used_list;

/// Scan `[lo, hi)` at pointer stride. Every word that lands inside a used
/// block's client payload marks that block and recurses into its payload,
/// so pointers stored by the client inside heap blocks are followed too.
/// A block already marked this cycle is never re-descended into.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`; `[lo, hi)` must be
/// readable memory (the call stack, or a block's own payload).
pub(crate) unsafe fn mark_range(base: usize, used_head: Offset, lo: usize, hi: usize) {
    let stride = core::mem::size_of::<usize>();
    let mut addr = lo;
    while addr + stride <= hi {
        let word = *(addr as *const usize);
        if let Some(off) = used_list::find(base, used_head, word) {
            let p = header_ptr(base, off);
            if (*p).mark == UNMARKED {
                (*p).mark = MARKED;
                trace!("mark: {off:?} reachable from {addr:#x}");
                let cell_addr = to_addr(base, off);
                let client_lo = cell_addr + HEADER_SIZE;
                let client_hi = cell_addr + (*p).size as usize * ALLOC_UNIT;
                mark_range(base, used_head, client_lo, client_hi);
            }
        }
        addr += stride;
    }
}

/// Establish a low-water-mark stack address and scan up to `stack_top`.
///
/// `#[inline(never)]` keeps the compiler from hoisting `low_water`'s address
/// below the frame we actually want as our scan floor.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`, and `stack_top` must
/// bound the caller's live stack from above.
#[inline(never)]
pub(crate) unsafe fn mark(base: usize, used_head: Offset, stack_top: usize) {
    let low_water: usize = 0;
    let lo = &low_water as *const usize as usize;
    mark_range(base, used_head, lo, stack_top);
}
