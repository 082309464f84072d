//! Observable counters. A snapshot is returned by `Gc::stats` and rendered
//! by `Gc::print_stats` in the same shape the source's `gc_print_stats` used.

use std::fmt;

/// A point-in-time snapshot of the collector's counters and list sizes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub bytes_allocated: usize,
    pub bytes_freed: usize,
    pub blocks_allocated: usize,
    pub blocks_freed: usize,
    pub used_list_len: usize,
    pub free_list_len: usize,
    pub used_bytes: usize,
    pub free_bytes: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== gc stats ==")?;
        writeln!(f, "bytes allocated: {}", self.bytes_allocated)?;
        writeln!(f, "bytes freed: {}", self.bytes_freed)?;
        writeln!(f, "blocks allocated: {}", self.blocks_allocated)?;
        writeln!(f, "blocks freed: {}", self.blocks_freed)?;
        writeln!(f, "used_list length: {}", self.used_list_len)?;
        writeln!(f, "free_list length: {}", self.free_list_len)?;
        writeln!(f, "used space: {}", self.used_bytes)?;
        write!(f, "free space: {}", self.free_bytes)
    }
}
