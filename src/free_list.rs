//! The address-sorted free list: first-fit search with split, and
//! insertion-time coalescing of adjacent blocks.

use log::trace;

use crate::cell::CellHeader;
use crate::constants::MAX_INDEX;
use crate::offset::{header_ptr, Offset};
use crate::stats::Stats;

/// First-fit search for a block of at least `units` slots, splitting the
/// remainder back onto the free list. Returns the offset of the (possibly
/// shrunk) block now ready to be handed to the client, or `None` if no block
/// is large enough, or if the resulting link would overflow the 16-bit
/// offset encoding.
///
/// # Safety
/// `base` must be the base address of a region initialized by [`crate::heap::Gc::init`],
/// and `free_head` must be that region's current free-list head.
pub(crate) unsafe fn first_fit(base: usize, free_head: &mut Offset, units: u16) -> Option<Offset> {
    // `link` is the slot we'll rewrite once we commit to a block: either the
    // free-list head itself, or the `next` field of the predecessor cell.
    let mut link: *mut u16 = &mut free_head.0;
    let mut cur = *free_head;

    while !cur.is_null() {
        let p = header_ptr(base, cur);
        if (*p).size < units {
            link = &mut (*p).next;
            cur = Offset((*p).next);
            continue;
        }

        let old_size = (*p).size;
        let new_size = old_size - units;
        (*p).size = units;
        (*p).conf = CellHeader::conf_for(units);

        if new_size != 0 {
            // Matches the source's bare `u16` arithmetic: a region large
            // enough to wrap this is rejected right below by the MAX_INDEX
            // check, not by panicking here.
            let new_off = Offset(cur.0.wrapping_add(units));
            let new_p = header_ptr(base, new_off);
            (*new_p).size = new_size;
            (*new_p).next = (*p).next;
            (*new_p).conf = CellHeader::conf_for(new_size);
            (*new_p).used = 0;
            *link = new_off.0;
        } else {
            *link = (*p).next;
        }

        if *link >= MAX_INDEX {
            trace!("free_list: split of block {cur:?} would overflow MAX_INDEX");
            return None;
        }

        debug_assert_eq!((*p).size, units);
        debug_assert!((*p).check_conf());
        return Some(cur);
    }
    None
}

/// Return block `item` to the free list, coalescing with either or both
/// neighbors as described by the insertion table.
///
/// # Safety
/// Same preconditions as [`first_fit`]; `item` must not currently be on the
/// free list.
pub(crate) unsafe fn insert(base: usize, free_head: &mut Offset, item: Offset, stats: &mut Stats) {
    let i_size = (*header_ptr(base, item)).size;
    stats.bytes_freed += i_size as usize * crate::constants::ALLOC_UNIT;
    stats.blocks_freed += 1;

    let mut p_off = *free_head;
    let mut c_off = *free_head;
    while !c_off.is_null() && c_off.0 < item.0 {
        p_off = c_off;
        c_off = (*header_ptr(base, c_off)).next_offset();
    }

    if p_off == c_off {
        // Inserting at (or before) the head -- includes an empty free list.
        let c_adjacent = !c_off.is_null() && item.0 + i_size == c_off.0;
        if c_adjacent {
            let c_next = (*header_ptr(base, c_off)).next;
            let c_size = (*header_ptr(base, c_off)).size;
            let i = header_ptr(base, item);
            (*i).size += c_size;
            (*i).next = c_next;
            (*i).conf = CellHeader::conf_for((*i).size);
        } else {
            (*header_ptr(base, item)).next = c_off.0;
        }
        *free_head = item;
        return;
    }

    let p_adjacent = {
        let p = header_ptr(base, p_off);
        p_off.0 + (*p).size == item.0
    };
    let c_adjacent = !c_off.is_null() && item.0 + i_size == c_off.0;

    match (p_adjacent, c_adjacent) {
        (true, true) => {
            let c = header_ptr(base, c_off);
            let (c_size, c_next) = ((*c).size, (*c).next);
            let p = header_ptr(base, p_off);
            (*p).size += i_size + c_size;
            (*p).next = c_next;
            (*p).conf = CellHeader::conf_for((*p).size);
        }
        (true, false) => {
            let p = header_ptr(base, p_off);
            (*p).size += i_size;
            (*p).next = c_off.0;
            (*p).conf = CellHeader::conf_for((*p).size);
        }
        (false, true) => {
            let c = header_ptr(base, c_off);
            let (c_size, c_next) = ((*c).size, (*c).next);
            let i = header_ptr(base, item);
            (*i).size += c_size;
            (*i).next = c_next;
            (*i).conf = CellHeader::conf_for((*i).size);
            (*header_ptr(base, p_off)).next = item.0;
        }
        (false, false) => {
            (*header_ptr(base, p_off)).next = item.0;
            (*header_ptr(base, item)).next = c_off.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn put_free_cell(base: usize, off: Offset, size: u16, next: Offset) {
        let p = header_ptr(base, off);
        (*p).size = size;
        (*p).next = next.0;
        (*p).conf = CellHeader::conf_for(size);
        (*p).used = 0;
    }

    #[test]
    fn split_shrinks_block_and_creates_remainder() {
        unsafe {
            let mut region = vec![0u8; 16 * crate::constants::ALLOC_UNIT];
            let base = region.as_mut_ptr() as usize;
            let mut free_head = Offset(1);
            put_free_cell(base, Offset(1), 15, Offset::NULL);

            let got = first_fit(base, &mut free_head, 4).unwrap();
            assert_eq!(got, Offset(1));
            assert_eq!((*header_ptr(base, Offset(1))).size, 4);
            assert_eq!(free_head, Offset(5));
            assert_eq!((*header_ptr(base, Offset(5))).size, 11);
        }
    }

    #[test]
    fn exact_fit_unlinks_without_split() {
        unsafe {
            let mut region = vec![0u8; 16 * crate::constants::ALLOC_UNIT];
            let base = region.as_mut_ptr() as usize;
            let mut free_head = Offset(1);
            put_free_cell(base, Offset(1), 4, Offset::NULL);

            let got = first_fit(base, &mut free_head, 4).unwrap();
            assert_eq!(got, Offset(1));
            assert_eq!(free_head, Offset::NULL);
        }
    }

    #[test]
    fn coalesces_with_both_neighbors() {
        unsafe {
            let mut region = vec![0u8; 16 * crate::constants::ALLOC_UNIT];
            let base = region.as_mut_ptr() as usize;

            // Free blocks at 1 (size 2) and 5 (size 2), with [3,5) used and
            // about to be freed -- inserting offset 3 should merge all three
            // into a single block spanning 1..7.
            let mut free_head = Offset(1);
            put_free_cell(base, Offset(1), 2, Offset(5));
            put_free_cell(base, Offset(5), 2, Offset::NULL);
            put_free_cell(base, Offset(3), 2, Offset::NULL);

            let mut stats = Stats::default();
            insert(base, &mut free_head, Offset(3), &mut stats);

            assert_eq!(free_head, Offset(1));
            let merged = &*header_ptr(base, Offset(1));
            assert_eq!(merged.size, 6);
            assert_eq!(merged.next, 0);
            assert!(merged.check_conf());
        }
    }

    #[test]
    fn inserts_into_empty_list() {
        unsafe {
            let mut region = vec![0u8; 8 * crate::constants::ALLOC_UNIT];
            let base = region.as_mut_ptr() as usize;
            let mut free_head = Offset::NULL;
            (*header_ptr(base, Offset(1))).size = 3;

            let mut stats = Stats::default();
            insert(base, &mut free_head, Offset(1), &mut stats);

            assert_eq!(free_head, Offset(1));
            assert_eq!((*header_ptr(base, Offset(1))).next, 0);
        }
    }
}
