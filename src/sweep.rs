//! The unmark and sweep halves of a collection cycle.

use crate::cell::UNMARKED;
use crate::free_list;
use crate::offset::{header_ptr, Offset};
use crate::stats::Stats;

/// Set `mark = UNMARKED` on every block currently on the used list. Run once
/// at the start of every collection cycle, before the mark phase.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`.
pub(crate) unsafe fn unmark_all(base: usize, used_head: Offset) {
    let mut cur = used_head;
    while !cur.is_null() {
        let p = header_ptr(base, cur);
        (*p).mark = UNMARKED;
        cur = Offset((*p).next);
    }
}

/// Move every unmarked block from the used list to the free list, preserving
/// list integrity by maintaining a pointer-to-link rather than rewriting the
/// traversal cursor unconditionally (see the open question on the source's
/// sweep loop).
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`.
pub(crate) unsafe fn sweep(
    base: usize,
    used_head: &mut Offset,
    free_head: &mut Offset,
    stats: &mut Stats,
) {
    let mut link: *mut u16 = &mut used_head.0;
    let mut cur = *used_head;

    while !cur.is_null() {
        let p = header_ptr(base, cur);
        let next = Offset((*p).next);

        if (*p).mark == UNMARKED {
            *link = next.0;
            (*p).used = 0;
            free_list::insert(base, free_head, cur, stats);
        } else {
            link = &mut (*p).next;
        }

        cur = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellHeader, MARKED};
    use crate::used_list;

    #[test]
    fn sweep_reclaims_only_unmarked_and_preserves_survivors() {
        unsafe {
            let mut region = vec![0u8; 8 * crate::constants::ALLOC_UNIT];
            let base = region.as_mut_ptr() as usize;

            let mut used_head = Offset::NULL;
            let mut free_head = Offset::NULL;
            let mut stats = Stats::default();

            for off in [Offset(1), Offset(2), Offset(3)] {
                let p = header_ptr(base, off);
                (*p).size = 1;
                (*p).conf = CellHeader::conf_for(1);
                used_list::push_front(base, &mut used_head, off);
            }
            // Mark only offset 2 as reachable.
            (*header_ptr(base, Offset(2))).mark = MARKED;

            sweep(base, &mut used_head, &mut free_head, &mut stats);

            assert_eq!(crate::list::len(base, used_head), 1);
            assert_eq!(crate::list::len(base, free_head), 2);
            assert_eq!(stats.blocks_freed, 2);
        }
    }
}
