//! Region setup, the top-level allocation entry points, and the full
//! collection cycle. This is the crate's single stateful object.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr;

use log::{debug, error, info};
use spin::Mutex;

use crate::cell::{units_for, CellHeader, HEADER_SIZE, UNMARKED};
use crate::constants::{ALLOC_UNIT, PAGE_SIZE};
use crate::error::GcError;
use crate::free_list;
use crate::list;
use crate::mark;
use crate::offset::{header_ptr, to_addr, to_offset, Offset};
use crate::options::Options;
use crate::stats::Stats;
use crate::sweep;
use crate::used_list;

struct GlobalState {
    region: *mut u8,
    layout: Layout,
    free_head: Offset,
    used_head: Offset,
    stack_top: usize,
    stats: Stats,
    options: Options,
}

// `GlobalState` owns its heap region exclusively and is only ever touched
// through `Gc`'s `Mutex`, so handing it across threads is sound even though
// it holds a raw pointer.
unsafe impl Send for GlobalState {}

/// A conservative mark-and-sweep collector over one fixed-size heap region.
///
/// All state is process-wide from the perspective of the client: there is no
/// `free`, and reachability (as conservatively determined by scanning the
/// call stack) is the only thing that reclaims a block. See the crate-level
/// docs for the invariants this type upholds.
pub struct Gc {
    state: Mutex<GlobalState>,
}

impl Gc {
    /// Reserve the heap region and record the stack's upper bound.
    ///
    /// `frame_hint` must be the address of a local variable in (or near) the
    /// outermost frame of the client's call stack; everything above it, up
    /// to the next page boundary, is treated as out of scan range.
    pub fn init(frame_hint: *const u8, options: Options) -> Gc {
        crate::logger::try_init();

        let chunk_size = options.chunk_size;
        let layout = Layout::from_size_align(chunk_size, chunk_size)
            .expect("chunk_size must be a nonzero power of two");
        let region = unsafe { alloc_zeroed(layout) };
        assert!(
            !region.is_null(),
            "failed to reserve a {chunk_size} byte heap region"
        );

        let cell_count = options.cell_count();
        let base = region as usize;
        unsafe {
            let base_cell = header_ptr(base, Offset(1));
            (*base_cell).size = (cell_count - 1) as u16;
            (*base_cell).next = 0;
            (*base_cell).conf = CellHeader::conf_for((*base_cell).size);
        }

        let frame_addr = frame_hint as usize;
        let stack_top = (frame_addr / PAGE_SIZE + 1) * PAGE_SIZE;

        info!(
            "tinygc: reserved {chunk_size} byte heap at {region:p}, stack_top = {stack_top:#x}"
        );

        Gc {
            state: Mutex::new(GlobalState {
                region,
                layout,
                free_head: Offset(1),
                used_head: Offset::NULL,
                stack_top,
                stats: Stats::default(),
                options,
            }),
        }
    }

    /// Allocate `n_bytes` of zero-poisoned storage. Runs a full collection
    /// cycle and retries once if the heap is full; panics with `oom @
    /// malloc(<n>)` if that retry also fails.
    pub fn alloc(&self, n_bytes: usize) -> *mut u8 {
        if let Some(ptr) = self.try_alloc_once(n_bytes) {
            return ptr;
        }
        debug!("tinygc: alloc({n_bytes}) failed, running a collection cycle");
        self.collect();
        if let Some(ptr) = self.try_alloc_once(n_bytes) {
            return ptr;
        }

        self.print_stats();
        error!("oom @ malloc({n_bytes})");
        panic!("oom @ malloc({n_bytes})");
    }

    /// Like [`Gc::alloc`], but returns [`GcError::OutOfMemory`] instead of
    /// panicking when the post-collection retry also fails.
    pub fn try_alloc(&self, n_bytes: usize) -> Result<*mut u8, GcError> {
        if let Some(ptr) = self.try_alloc_once(n_bytes) {
            return Ok(ptr);
        }
        self.collect();
        self.try_alloc_once(n_bytes)
            .ok_or(GcError::OutOfMemory {
                requested_bytes: n_bytes,
            })
    }

    fn try_alloc_once(&self, n_bytes: usize) -> Option<*mut u8> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let units = units_for(n_bytes);
        state.stats.bytes_allocated += units as usize * ALLOC_UNIT;
        state.stats.blocks_allocated += 1;

        let base = state.region as usize;
        let off = unsafe { free_list::first_fit(base, &mut state.free_head, units)? };

        unsafe {
            (*header_ptr(base, off)).mark = UNMARKED;
            used_list::push_front(base, &mut state.used_head, off);

            let client_addr = to_addr(base, off) + HEADER_SIZE;
            if state.options.poison {
                ptr::write_bytes(client_addr as *mut u8, state.options.poison_byte, n_bytes);
            }
            Some(client_addr as *mut u8)
        }
    }

    /// Run a full collection cycle: unmark every used block, conservatively
    /// trace the call stack (and anything reachable from it), then sweep
    /// every block that was not reached back onto the free list.
    pub fn collect(&self) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let base = state.region as usize;

        debug!(
            "tinygc: collection start, used={} free={}",
            unsafe { list::len(base, state.used_head) },
            unsafe { list::len(base, state.free_head) }
        );

        unsafe {
            sweep::unmark_all(base, state.used_head);
            mark::mark(base, state.used_head, state.stack_top);
            sweep::sweep(
                base,
                &mut state.used_head,
                &mut state.free_head,
                &mut state.stats,
            );
        }

        debug!(
            "tinygc: collection end, used={} free={}",
            unsafe { list::len(base, state.used_head) },
            unsafe { list::len(base, state.free_head) }
        );
    }

    /// Snapshot the collector's counters and list sizes.
    pub fn stats(&self) -> Stats {
        let guard = self.state.lock();
        let base = guard.region as usize;
        unsafe {
            Stats {
                used_list_len: list::len(base, guard.used_head),
                free_list_len: list::len(base, guard.free_head),
                used_bytes: list::total_bytes(base, guard.used_head),
                free_bytes: list::total_bytes(base, guard.free_head),
                ..guard.stats
            }
        }
    }

    /// Emit counters and list summaries to standard output.
    pub fn print_stats(&self) {
        let stats = self.stats();
        info!("{stats}");
        println!("{stats}");
    }

    /// Emit the header fields of the block containing `address`.
    ///
    /// Returns [`GcError::InvalidAddress`] if `address` does not lie inside
    /// the heap region.
    pub fn print_info(&self, address: *const u8) -> Result<(), GcError> {
        let guard = self.state.lock();
        let base = guard.region as usize;
        let addr = address as usize;
        let region_end = base + guard.options.chunk_size;
        if addr < base + HEADER_SIZE || addr >= region_end {
            return Err(GcError::InvalidAddress);
        }

        let off = to_offset(base, addr - HEADER_SIZE);
        let cell = unsafe { &*header_ptr(base, off) };
        println!(
            "cell +{} {{size: {}, next: {}, conf: {}, used: {}, mark: {}}}",
            off.0, cell.size, cell.next, cell.conf, cell.used, cell.mark
        );
        Ok(())
    }
}

impl Drop for Gc {
    fn drop(&mut self) {
        let guard = self.state.lock();
        unsafe {
            dealloc(guard.region, guard.layout);
        }
    }
}
