//! Runtime-overridable tunables. `Options::default()` reproduces the fixed
//! constants a from-scratch port of this collector would hard-code.

use crate::constants::{ALLOC_UNIT, CHUNK_SIZE, POISON_BYTE};

/// Configuration for a [`crate::heap::Gc`] instance.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Size of the backing heap region, in bytes. Must be a power of two,
    /// since the region is required to be aligned to its own size.
    pub chunk_size: usize,
    /// Whether freshly allocated payloads are overwritten with `poison_byte`.
    pub poison: bool,
    /// The byte used to poison freshly allocated payloads.
    pub poison_byte: u8,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            chunk_size: CHUNK_SIZE,
            poison: true,
            poison_byte: POISON_BYTE,
        }
    }
}

impl Options {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_poison(mut self, poison: bool) -> Self {
        self.poison = poison;
        self
    }

    pub fn with_poison_byte(mut self, poison_byte: u8) -> Self {
        self.poison_byte = poison_byte;
        self
    }

    /// Number of `ALLOC_UNIT`-sized slots the region is divided into.
    pub fn cell_count(&self) -> usize {
        self.chunk_size / ALLOC_UNIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let opts = Options::default();
        assert_eq!(opts.chunk_size, CHUNK_SIZE);
        assert_eq!(opts.cell_count(), CHUNK_SIZE / ALLOC_UNIT);
        assert!(opts.poison);
    }

    #[test]
    fn builder_overrides_fields() {
        let opts = Options::default().with_chunk_size(4096).with_poison(false);
        assert_eq!(opts.chunk_size, 4096);
        assert_eq!(opts.cell_count(), 256);
        assert!(!opts.poison);
    }

    #[test]
    fn custom_poison_byte_is_written_into_allocated_payload() {
        let opts = Options::default()
            .with_chunk_size(4096)
            .with_poison_byte(0xCC);
        let frame: u8 = 0;
        let gc = crate::heap::Gc::init(&frame as *const u8, opts);
        let p = gc.alloc(8);
        let payload = unsafe { std::slice::from_raw_parts(p, 8) };
        assert!(payload.iter().all(|&b| b == 0xCC));
    }
}
