//! Transient (one-frame) vertex/index ring sub-allocators.
//!
//! The original engine folds this bookkeeping directly into
//! `RenderContext`'s per-frame counters; here it gets its own module
//! boundary since the ring allocator is a distinct enough concern to
//! stand on its own.

use crate::handle::{IndexBufferHandle, VertexBufferHandle};
use crate::vertex::VertexFormat;

/// What a producer gets back from a transient reservation: just enough
/// to record a draw against it. Intentionally carries nothing about how
/// the ring is laid out in memory — only (underlying buffer handle,
/// byte offset, element count, byte size, format).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransientVertexReservation {
    pub buffer: VertexBufferHandle,
    pub byte_offset: u32,
    pub vertex_count: u32,
    pub byte_size: u32,
    pub format: VertexFormat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransientIndexReservation {
    pub buffer: IndexBufferHandle,
    pub byte_offset: u32,
    pub index_count: u32,
    pub byte_size: u32,
}

const INDEX_STRIDE: u32 = 2;

/// A ring sub-allocator over one shared dynamic buffer. The buffer
/// itself is created once at startup (via
/// `create_dynamic_vertex_buffer`/`create_dynamic_index_buffer`);
/// [`TransientRing::reset`] is called at the start of every submit
/// context, and reservations made during a frame are invalid once the
/// context swap that follows has happened.
pub struct TransientVertexRing {
    buffer: VertexBufferHandle,
    capacity_bytes: u32,
    cursor: u32,
}

impl TransientVertexRing {
    pub fn new(buffer: VertexBufferHandle, capacity_bytes: u32) -> Self {
        TransientVertexRing { buffer, capacity_bytes, cursor: 0 }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Reserves `count` vertices of `format`, advancing the ring cursor.
    /// Fatal if the ring has no room left (programming error: the
    /// producer asked for more transient geometry than the configured
    /// ring size in a single frame).
    pub fn reserve(&mut self, count: u32, format: VertexFormat) -> TransientVertexReservation {
        let byte_size = count * format.bytes_per_vertex();
        if self.cursor + byte_size > self.capacity_bytes {
            crate::error::fatal_capacity_overflow("transient vertex ring", self.capacity_bytes as usize);
        }
        let offset = self.cursor;
        self.cursor += byte_size;
        TransientVertexReservation {
            buffer: self.buffer,
            byte_offset: offset,
            vertex_count: count,
            byte_size,
            format,
        }
    }
}

pub struct TransientIndexRing {
    buffer: IndexBufferHandle,
    capacity_bytes: u32,
    cursor: u32,
}

impl TransientIndexRing {
    pub fn new(buffer: IndexBufferHandle, capacity_bytes: u32) -> Self {
        TransientIndexRing { buffer, capacity_bytes, cursor: 0 }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn reserve(&mut self, count: u32) -> TransientIndexReservation {
        let byte_size = count * INDEX_STRIDE;
        if self.cursor + byte_size > self.capacity_bytes {
            crate::error::fatal_capacity_overflow("transient index ring", self.capacity_bytes as usize);
        }
        let offset = self.cursor;
        self.cursor += byte_size;
        TransientIndexReservation { buffer: self.buffer, byte_offset: offset, index_count: count, byte_size }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RawHandle;

    fn dummy_vb() -> VertexBufferHandle {
        VertexBufferHandle::new(RawHandle { index: 0, generation: 0 })
    }

    fn dummy_ib() -> IndexBufferHandle {
        IndexBufferHandle::new(RawHandle { index: 0, generation: 0 })
    }

    #[test]
    fn reservation_advances_and_resets() {
        let mut ring = TransientVertexRing::new(dummy_vb(), 1024);
        let r1 = ring.reserve(3, VertexFormat::P3);
        assert_eq!(r1.byte_offset, 0);
        assert_eq!(r1.byte_size, 36);
        let r2 = ring.reserve(3, VertexFormat::P3);
        assert_eq!(r2.byte_offset, 36);
        ring.reset();
        let r3 = ring.reserve(3, VertexFormat::P3);
        assert_eq!(r3.byte_offset, 0);
    }

    #[test]
    fn index_ring_uses_two_byte_stride() {
        let mut ring = TransientIndexRing::new(dummy_ib(), 1024);
        let r = ring.reserve(6);
        assert_eq!(r.byte_size, 12);
    }

    #[test]
    #[should_panic(expected = "<Exhausted>")]
    fn overflow_is_fatal() {
        let mut ring = TransientVertexRing::new(dummy_vb(), 8);
        ring.reserve(3, VertexFormat::P3);
    }
}
