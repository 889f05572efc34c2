//! The typed, append-only command buffer.
//!
//! Grounded on `engine/renderers/CommandBuffer.h`: a fixed-capacity byte
//! array plus a cursor, a closed set of 1-byte command tags, and
//! `commit()` which appends the terminal tag and resets the cursor to 0
//! so the render thread can read the same bytes back from the start.
//! The original does this with `memcpy`-based `write<T>`/`read<T>`
//! template methods operating on raw pointers; this module replaces
//! that with a safe `byteorder`-backed cursor, per the "do NOT expose
//! raw pointers across the thread boundary" re-architecture note.

use crate::error::fatal_capacity_overflow;
use crate::handle::{
    IndexBufferHandle, ProgramHandle, RawHandle, RenderTargetHandle, ShaderHandle, TextureHandle,
    UniformHandle, VertexBufferHandle,
};
use crate::pixel::PixelFormat;
use crate::uniform::UniformType;
use crate::vertex::VertexFormat;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandTag {
    Init = 0,
    Shutdown = 1,
    CreateVertexBuffer = 2,
    CreateDynamicVertexBuffer = 3,
    UpdateVertexBuffer = 4,
    DestroyVertexBuffer = 5,
    CreateIndexBuffer = 6,
    CreateDynamicIndexBuffer = 7,
    UpdateIndexBuffer = 8,
    DestroyIndexBuffer = 9,
    CreateTexture = 10,
    UpdateTexture = 11,
    DestroyTexture = 12,
    CreateShader = 13,
    DestroyShader = 14,
    CreateProgram = 15,
    DestroyProgram = 16,
    CreateUniform = 17,
    DestroyUniform = 18,
    CreateRenderTarget = 19,
    DestroyRenderTarget = 20,
    EndOfFrame = 21,
}

impl CommandTag {
    fn from_u8(tag: u8) -> CommandTag {
        match tag {
            0 => CommandTag::Init,
            1 => CommandTag::Shutdown,
            2 => CommandTag::CreateVertexBuffer,
            3 => CommandTag::CreateDynamicVertexBuffer,
            4 => CommandTag::UpdateVertexBuffer,
            5 => CommandTag::DestroyVertexBuffer,
            6 => CommandTag::CreateIndexBuffer,
            7 => CommandTag::CreateDynamicIndexBuffer,
            8 => CommandTag::UpdateIndexBuffer,
            9 => CommandTag::DestroyIndexBuffer,
            10 => CommandTag::CreateTexture,
            11 => CommandTag::UpdateTexture,
            12 => CommandTag::DestroyTexture,
            13 => CommandTag::CreateShader,
            14 => CommandTag::DestroyShader,
            15 => CommandTag::CreateProgram,
            16 => CommandTag::DestroyProgram,
            17 => CommandTag::CreateUniform,
            18 => CommandTag::DestroyUniform,
            19 => CommandTag::CreateRenderTarget,
            20 => CommandTag::DestroyRenderTarget,
            21 => CommandTag::EndOfFrame,
            other => crate::error::fatal_unknown_command(other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// A fully decoded command, as read back by the render thread.
#[derive(Debug, Clone)]
pub enum Command {
    Init,
    Shutdown,
    CreateVertexBuffer { handle: VertexBufferHandle, format: VertexFormat, data: Option<Vec<u8>> },
    CreateDynamicVertexBuffer { handle: VertexBufferHandle, size: u32, format: VertexFormat },
    UpdateVertexBuffer { handle: VertexBufferHandle, offset: u32, data: Vec<u8> },
    DestroyVertexBuffer { handle: VertexBufferHandle },
    CreateIndexBuffer { handle: IndexBufferHandle, data: Option<Vec<u8>> },
    CreateDynamicIndexBuffer { handle: IndexBufferHandle, size: u32 },
    UpdateIndexBuffer { handle: IndexBufferHandle, offset: u32, data: Vec<u8> },
    DestroyIndexBuffer { handle: IndexBufferHandle },
    CreateTexture { handle: TextureHandle, width: u32, height: u32, format: PixelFormat, data: Option<Vec<u8>> },
    UpdateTexture { handle: TextureHandle, data: Vec<u8> },
    DestroyTexture { handle: TextureHandle },
    CreateShader { handle: ShaderHandle, stage: ShaderStage, source: Vec<u8> },
    DestroyShader { handle: ShaderHandle },
    CreateProgram { handle: ProgramHandle, vertex_shader: ShaderHandle, fragment_shader: ShaderHandle },
    DestroyProgram { handle: ProgramHandle },
    CreateUniform { handle: UniformHandle, name: String, ty: UniformType, count: u32 },
    DestroyUniform { handle: UniformHandle },
    CreateRenderTarget { handle: RenderTargetHandle, width: u32, height: u32, format: PixelFormat },
    DestroyRenderTarget { handle: RenderTargetHandle },
}

/// A fixed-capacity, append-only, typed byte buffer.
pub struct CommandBuffer {
    buffer: Vec<u8>,
    capacity: usize,
    cursor: usize,
}

impl CommandBuffer {
    pub fn new(capacity: usize) -> Self {
        let mut buffer = vec![0u8; capacity];
        buffer[0] = CommandTag::EndOfFrame as u8;
        CommandBuffer { buffer, capacity, cursor: 0 }
    }

    fn reserve(&mut self, len: usize) -> usize {
        if self.cursor + len > self.capacity {
            fatal_capacity_overflow("command buffer", self.capacity);
        }
        let at = self.cursor;
        self.cursor += len;
        at
    }

    fn write_u8(&mut self, v: u8) {
        let at = self.reserve(1);
        self.buffer[at] = v;
    }

    fn write_u32(&mut self, v: u32) {
        let at = self.reserve(4);
        LittleEndian::write_u32(&mut self.buffer[at..at + 4], v);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        let at = self.reserve(bytes.len());
        self.buffer[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn write_opt_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(b) => {
                self.write_u8(1);
                self.write_bytes(b);
            }
            None => self.write_u8(0),
        }
    }

    fn write_handle(&mut self, h: RawHandle) {
        self.write_u32(h.index);
        self.write_u32(h.generation);
    }

    fn read_u8(&mut self) -> u8 {
        let at = self.reserve(1);
        self.buffer[at]
    }

    fn read_u32(&mut self) -> u32 {
        let at = self.reserve(4);
        LittleEndian::read_u32(&self.buffer[at..at + 4])
    }

    fn read_bytes(&mut self) -> Vec<u8> {
        let len = self.read_u32() as usize;
        let at = self.reserve(len);
        self.buffer[at..at + len].to_vec()
    }

    fn read_opt_bytes(&mut self) -> Option<Vec<u8>> {
        if self.read_u8() == 1 {
            Some(self.read_bytes())
        } else {
            None
        }
    }

    fn read_handle(&mut self) -> RawHandle {
        let index = self.read_u32();
        let generation = self.read_u32();
        RawHandle { index, generation }
    }

    /// Writes `command`'s tag and payload at the cursor.
    pub fn write_command(&mut self, command: &Command) {
        match command {
            Command::Init => self.write_u8(CommandTag::Init as u8),
            Command::Shutdown => self.write_u8(CommandTag::Shutdown as u8),
            Command::CreateVertexBuffer { handle, format, data } => {
                self.write_u8(CommandTag::CreateVertexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_u32(*format as u32);
                self.write_opt_bytes(data.as_deref());
            }
            Command::CreateDynamicVertexBuffer { handle, size, format } => {
                self.write_u8(CommandTag::CreateDynamicVertexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_u32(*size);
                self.write_u32(*format as u32);
            }
            Command::UpdateVertexBuffer { handle, offset, data } => {
                self.write_u8(CommandTag::UpdateVertexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_u32(*offset);
                self.write_bytes(data);
            }
            Command::DestroyVertexBuffer { handle } => {
                self.write_u8(CommandTag::DestroyVertexBuffer as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateIndexBuffer { handle, data } => {
                self.write_u8(CommandTag::CreateIndexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_opt_bytes(data.as_deref());
            }
            Command::CreateDynamicIndexBuffer { handle, size } => {
                self.write_u8(CommandTag::CreateDynamicIndexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_u32(*size);
            }
            Command::UpdateIndexBuffer { handle, offset, data } => {
                self.write_u8(CommandTag::UpdateIndexBuffer as u8);
                self.write_handle(handle.raw);
                self.write_u32(*offset);
                self.write_bytes(data);
            }
            Command::DestroyIndexBuffer { handle } => {
                self.write_u8(CommandTag::DestroyIndexBuffer as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateTexture { handle, width, height, format, data } => {
                self.write_u8(CommandTag::CreateTexture as u8);
                self.write_handle(handle.raw);
                self.write_u32(*width);
                self.write_u32(*height);
                self.write_u32(*format as u32);
                self.write_opt_bytes(data.as_deref());
            }
            Command::UpdateTexture { handle, data } => {
                self.write_u8(CommandTag::UpdateTexture as u8);
                self.write_handle(handle.raw);
                self.write_bytes(data);
            }
            Command::DestroyTexture { handle } => {
                self.write_u8(CommandTag::DestroyTexture as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateShader { handle, stage, source } => {
                self.write_u8(CommandTag::CreateShader as u8);
                self.write_handle(handle.raw);
                self.write_u8(match stage {
                    ShaderStage::Vertex => 0,
                    ShaderStage::Fragment => 1,
                });
                self.write_bytes(source);
            }
            Command::DestroyShader { handle } => {
                self.write_u8(CommandTag::DestroyShader as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateProgram { handle, vertex_shader, fragment_shader } => {
                self.write_u8(CommandTag::CreateProgram as u8);
                self.write_handle(handle.raw);
                self.write_handle(vertex_shader.raw);
                self.write_handle(fragment_shader.raw);
            }
            Command::DestroyProgram { handle } => {
                self.write_u8(CommandTag::DestroyProgram as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateUniform { handle, name, ty, count } => {
                self.write_u8(CommandTag::CreateUniform as u8);
                self.write_handle(handle.raw);
                self.write_bytes(name.as_bytes());
                self.write_u32(*ty as u32);
                self.write_u32(*count);
            }
            Command::DestroyUniform { handle } => {
                self.write_u8(CommandTag::DestroyUniform as u8);
                self.write_handle(handle.raw);
            }
            Command::CreateRenderTarget { handle, width, height, format } => {
                self.write_u8(CommandTag::CreateRenderTarget as u8);
                self.write_handle(handle.raw);
                self.write_u32(*width);
                self.write_u32(*height);
                self.write_u32(*format as u32);
            }
            Command::DestroyRenderTarget { handle } => {
                self.write_u8(CommandTag::DestroyRenderTarget as u8);
                self.write_handle(handle.raw);
            }
        }
    }

    /// Writes the end-of-frame tag and resets the cursor to 0, so a
    /// subsequent pass of `read_command` calls starts at the beginning
    /// — exactly the original's `commit()`.
    pub fn commit(&mut self) {
        self.write_u8(CommandTag::EndOfFrame as u8);
        log::trace!("command buffer commit at {} bytes", self.cursor);
        self.cursor = 0;
    }

    /// Resets the cursor to 0 and stamps an end-of-frame tag at the very
    /// start of the buffer, so a read before the next `write_command`
    /// sees an immediately-terminated (empty) stream rather than
    /// replaying the previous frame's commands. Used when a context is
    /// recycled after the render thread has drained it.
    pub fn clear(&mut self) {
        self.buffer[0] = CommandTag::EndOfFrame as u8;
        self.cursor = 0;
    }

    fn read_vertex_format(&mut self) -> VertexFormat {
        vertex_format_from_u32(self.read_u32())
    }

    fn read_pixel_format(&mut self) -> PixelFormat {
        pixel_format_from_u32(self.read_u32())
    }

    fn read_uniform_type(&mut self) -> UniformType {
        uniform_type_from_u32(self.read_u32())
    }

    /// Reads the next tag and its payload, advancing the cursor.
    /// Returns `None` on the end-of-frame tag (cursor is left just past
    /// it; callers normally stop the loop there). Panics with
    /// `<UnknownCommand>` on any tag outside the closed set.
    pub fn read_command(&mut self) -> Option<Command> {
        let tag = CommandTag::from_u8(self.read_u8());
        match tag {
            CommandTag::EndOfFrame => None,
            CommandTag::Init => Some(Command::Init),
            CommandTag::Shutdown => Some(Command::Shutdown),
            CommandTag::CreateVertexBuffer => {
                let handle = VertexBufferHandle::new(self.read_handle());
                let format = self.read_vertex_format();
                let data = self.read_opt_bytes();
                Some(Command::CreateVertexBuffer { handle, format, data })
            }
            CommandTag::CreateDynamicVertexBuffer => {
                let handle = VertexBufferHandle::new(self.read_handle());
                let size = self.read_u32();
                let format = self.read_vertex_format();
                Some(Command::CreateDynamicVertexBuffer { handle, size, format })
            }
            CommandTag::UpdateVertexBuffer => {
                let handle = VertexBufferHandle::new(self.read_handle());
                let offset = self.read_u32();
                let data = self.read_bytes();
                Some(Command::UpdateVertexBuffer { handle, offset, data })
            }
            CommandTag::DestroyVertexBuffer => {
                let handle = VertexBufferHandle::new(self.read_handle());
                Some(Command::DestroyVertexBuffer { handle })
            }
            CommandTag::CreateIndexBuffer => {
                let handle = IndexBufferHandle::new(self.read_handle());
                let data = self.read_opt_bytes();
                Some(Command::CreateIndexBuffer { handle, data })
            }
            CommandTag::CreateDynamicIndexBuffer => {
                let handle = IndexBufferHandle::new(self.read_handle());
                let size = self.read_u32();
                Some(Command::CreateDynamicIndexBuffer { handle, size })
            }
            CommandTag::UpdateIndexBuffer => {
                let handle = IndexBufferHandle::new(self.read_handle());
                let offset = self.read_u32();
                let data = self.read_bytes();
                Some(Command::UpdateIndexBuffer { handle, offset, data })
            }
            CommandTag::DestroyIndexBuffer => {
                let handle = IndexBufferHandle::new(self.read_handle());
                Some(Command::DestroyIndexBuffer { handle })
            }
            CommandTag::CreateTexture => {
                let handle = TextureHandle::new(self.read_handle());
                let width = self.read_u32();
                let height = self.read_u32();
                let format = self.read_pixel_format();
                let data = self.read_opt_bytes();
                Some(Command::CreateTexture { handle, width, height, format, data })
            }
            CommandTag::UpdateTexture => {
                let handle = TextureHandle::new(self.read_handle());
                let data = self.read_bytes();
                Some(Command::UpdateTexture { handle, data })
            }
            CommandTag::DestroyTexture => {
                let handle = TextureHandle::new(self.read_handle());
                Some(Command::DestroyTexture { handle })
            }
            CommandTag::CreateShader => {
                let handle = ShaderHandle::new(self.read_handle());
                let stage = if self.read_u8() == 0 { ShaderStage::Vertex } else { ShaderStage::Fragment };
                let source = self.read_bytes();
                Some(Command::CreateShader { handle, stage, source })
            }
            CommandTag::DestroyShader => {
                let handle = ShaderHandle::new(self.read_handle());
                Some(Command::DestroyShader { handle })
            }
            CommandTag::CreateProgram => {
                let handle = ProgramHandle::new(self.read_handle());
                let vertex_shader = ShaderHandle::new(self.read_handle());
                let fragment_shader = ShaderHandle::new(self.read_handle());
                Some(Command::CreateProgram { handle, vertex_shader, fragment_shader })
            }
            CommandTag::DestroyProgram => {
                let handle = ProgramHandle::new(self.read_handle());
                Some(Command::DestroyProgram { handle })
            }
            CommandTag::CreateUniform => {
                let handle = UniformHandle::new(self.read_handle());
                let name = String::from_utf8(self.read_bytes()).expect("uniform name must be utf8");
                let ty = self.read_uniform_type();
                let count = self.read_u32();
                Some(Command::CreateUniform { handle, name, ty, count })
            }
            CommandTag::DestroyUniform => {
                let handle = UniformHandle::new(self.read_handle());
                Some(Command::DestroyUniform { handle })
            }
            CommandTag::CreateRenderTarget => {
                let handle = RenderTargetHandle::new(self.read_handle());
                let width = self.read_u32();
                let height = self.read_u32();
                let format = self.read_pixel_format();
                Some(Command::CreateRenderTarget { handle, width, height, format })
            }
            CommandTag::DestroyRenderTarget => {
                let handle = RenderTargetHandle::new(self.read_handle());
                Some(Command::DestroyRenderTarget { handle })
            }
        }
    }
}

fn vertex_format_from_u32(v: u32) -> VertexFormat {
    use VertexFormat::*;
    match v {
        0 => P2,
        1 => P2N3,
        2 => P2C4,
        3 => P2T2,
        4 => P2N3C4,
        5 => P2N3C4T2,
        6 => P3,
        7 => P3N3,
        8 => P3C4,
        9 => P3T2,
        10 => P3N3C4,
        11 => P3N3T2,
        12 => P3N3C4T2,
        other => crate::error::fatal_unknown_command(other as u8),
    }
}

fn pixel_format_from_u32(v: u32) -> PixelFormat {
    use PixelFormat::*;
    match v {
        0 => Dxt1,
        1 => Dxt3,
        2 => Dxt5,
        3 => R8G8B8,
        4 => R8G8B8A8,
        5 => D16,
        6 => D24,
        7 => D32,
        8 => D24S8,
        other => crate::error::fatal_unknown_command(other as u8),
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
