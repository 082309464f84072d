//! The unordered used list: insertion, and point queries by interior address
//! for the mark phase.

use crate::cell::HEADER_SIZE;
use crate::constants::ALLOC_UNIT;
use crate::offset::{header_ptr, to_addr, Offset};

/// Push `item` onto the head of the used list.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`; `item` must not
/// already be linked into either list.
pub(crate) unsafe fn push_front(base: usize, used_head: &mut Offset, item: Offset) {
    let p = header_ptr(base, item);
    (*p).used = 1;
    (*p).next = used_head.0;
    *used_head = item;
}

/// Find the used-list block whose client payload contains `word`, treating
/// it as a candidate interior pointer. The lower bound is inclusive, the
/// upper bound exclusive: a word pointing exactly at the header is not a
/// hit, and a word pointing exactly past the payload is not a hit either.
///
/// # Safety
/// `base` must be a region initialized by `Gc::init`.
pub(crate) unsafe fn find(base: usize, used_head: Offset, word: usize) -> Option<Offset> {
    let mut cur = used_head;
    while !cur.is_null() {
        let p = header_ptr(base, cur);
        let cell_addr = to_addr(base, cur);
        let client_lo = cell_addr + HEADER_SIZE;
        let client_hi = cell_addr + (*p).size as usize * ALLOC_UNIT;
        if word >= client_lo && word < client_hi {
            return Some(cur);
        }
        cur = Offset((*p).next);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellHeader;

    fn make_region(slots: usize) -> Vec<u8> {
        vec![0u8; slots * crate::constants::ALLOC_UNIT]
    }

    #[test]
    fn find_is_interior_inclusive_lo_exclusive_hi() {
        unsafe {
            let mut region = make_region(8);
            let base = region.as_mut_ptr() as usize;

            let off = Offset(1);
            let p = header_ptr(base, off);
            (*p).size = 4;
            (*p).next = 0;
            (*p).conf = CellHeader::conf_for(4);
            (*p).used = 1;

            let cell_addr = to_addr(base, off);
            let client_lo = cell_addr + HEADER_SIZE;
            let client_hi = cell_addr + 4 * ALLOC_UNIT;

            let mut head = Offset::NULL;
            push_front(base, &mut head, off);

            assert_eq!(find(base, head, client_lo), Some(off));
            assert_eq!(find(base, head, client_hi - 1), Some(off));
            assert_eq!(find(base, head, client_hi), None);
            assert_eq!(find(base, head, cell_addr), None);
        }
    }
}
