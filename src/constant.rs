//! The typed constant buffer: per-draw uniform writes.
//!
//! Grounded on `engine/renderers/ConstantBuffer.h`: each entry is
//! (uniform type, uniform handle, byte size, payload bytes), terminated
//! by an end tag, and the render thread's `update_uniforms` loop
//! self-consumes the buffer exactly once per frame — preserved here as
//! an explicit reset of the cursor inside [`ConstantBuffer::drain`]
//! rather than the original's implicit "read past the end" behavior.

use crate::error::fatal_capacity_overflow;
use crate::handle::{RawHandle, UniformHandle};
use crate::uniform::UniformType;
use byteorder::{ByteOrder, LittleEndian};

const END_TAG: u8 = 0xFF;
const ENTRY_TAG: u8 = 0x01;

/// One decoded constant-buffer entry, as the render thread applies it.
#[derive(Debug, Clone)]
pub struct UniformWrite {
    pub handle: UniformHandle,
    pub ty: UniformType,
    pub bytes: Vec<u8>,
}

pub struct ConstantBuffer {
    buffer: Vec<u8>,
    capacity: usize,
    cursor: usize,
}

impl ConstantBuffer {
    pub fn new(capacity: usize) -> Self {
        let mut buffer = vec![0u8; capacity];
        buffer[0] = END_TAG;
        ConstantBuffer { buffer, capacity, cursor: 0 }
    }

    fn reserve(&mut self, len: usize) -> usize {
        if self.cursor + len > self.capacity {
            fatal_capacity_overflow("constant buffer", self.capacity);
        }
        let at = self.cursor;
        self.cursor += len;
        at
    }

    /// Writes the 4-tuple (type, id, byte-size, payload-bytes).
    pub fn write_constant(&mut self, handle: UniformHandle, ty: UniformType, data: &[u8]) {
        debug_assert_eq!(data.len() % ty.element_size(), 0, "constant payload size must be a whole number of {:?} elements", ty);
        let at = self.reserve(1);
        self.buffer[at] = ENTRY_TAG;

        let at = self.reserve(4);
        LittleEndian::write_u32(&mut self.buffer[at..at + 4], handle.raw.index);
        let at = self.reserve(4);
        LittleEndian::write_u32(&mut self.buffer[at..at + 4], handle.raw.generation);

        let at = self.reserve(4);
        LittleEndian::write_u32(&mut self.buffer[at..at + 4], ty as u32);

        let at = self.reserve(4);
        LittleEndian::write_u32(&mut self.buffer[at..at + 4], data.len() as u32);

        let at = self.reserve(data.len());
        self.buffer[at..at + data.len()].copy_from_slice(data);
    }

    /// Writes the terminal tag and resets the cursor to 0.
    pub fn commit(&mut self) {
        let at = self.reserve(1);
        self.buffer[at] = END_TAG;
        log::trace!("constant buffer commit at {} bytes", self.cursor);
        self.cursor = 0;
    }

    /// Resets the cursor to 0 and stamps an end tag at the very start of
    /// the buffer, so a `drain()` called before the next `write_constant`
    /// sees an empty stream instead of replaying last frame's entries.
    pub fn clear(&mut self) {
        self.buffer[0] = END_TAG;
        self.cursor = 0;
    }

    /// Reads every entry until the end tag, consuming the buffer as it
    /// goes (the cursor is left at the position of the end tag plus
    /// one). Intended to be called exactly once per frame, before
    /// `clear()`, matching the self-consuming read the original
    /// performs.
    pub fn drain(&mut self) -> Vec<UniformWrite> {
        let mut writes = Vec::new();
        loop {
            let tag = self.buffer[self.cursor];
            self.cursor += 1;
            if tag == END_TAG {
                break;
            }
            let index = LittleEndian::read_u32(&self.buffer[self.cursor..self.cursor + 4]);
            self.cursor += 4;
            let generation = LittleEndian::read_u32(&self.buffer[self.cursor..self.cursor + 4]);
            self.cursor += 4;
            let ty_raw = LittleEndian::read_u32(&self.buffer[self.cursor..self.cursor + 4]);
            self.cursor += 4;
            let size = LittleEndian::read_u32(&self.buffer[self.cursor..self.cursor + 4]) as usize;
            self.cursor += 4;
            let bytes = self.buffer[self.cursor..self.cursor + size].to_vec();
            self.cursor += size;

            writes.push(UniformWrite {
                handle: UniformHandle::new(RawHandle { index, generation }),
                ty: uniform_type_from_u32(ty_raw),
                bytes,
            });
        }
        writes
    }
}

fn uniform_type_from_u32(v: u32) -> UniformType {
    use UniformType::*;
    match v {
        0 => Integer1,
        1 => Integer2,
        2 => Integer3,
        3 => Integer4,
        4 => Float1,
        5 => Float2,
        6 => Float3,
        7 => Float4,
        8 => Float3x3,
        9 => Float4x4,
        other => crate::error::fatal_unknown_command(other as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RawHandle;

    #[test]
    fn roundtrip_uniform_writes() {
        let mut cbuf = ConstantBuffer::new(256);
        let h = UniformHandle::new(RawHandle { index: 1, generation: 0 });
        let v: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
        let bytes: Vec<u8> = v.iter().flat_map(|f| f.to_le_bytes().to_vec()).collect();
        cbuf.write_constant(h, UniformType::Float4, &bytes);
        cbuf.commit();

        let writes = cbuf.drain();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].handle, h);
        assert_eq!(writes[0].ty, UniformType::Float4);
        assert_eq!(writes[0].bytes, bytes);
    }

    #[test]
    fn drain_twice_in_one_frame_yields_empty_second_pass() {
        let mut cbuf = ConstantBuffer::new(256);
        let h = UniformHandle::new(RawHandle { index: 1, generation: 0 });
        cbuf.write_constant(h, UniformType::Float1, &1.0f32.to_le_bytes());
        cbuf.commit();
        assert_eq!(cbuf.drain().len(), 1);
        cbuf.clear();
        assert_eq!(cbuf.drain().len(), 0);
    }
}
