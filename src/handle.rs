//! Typed, generational handles for GPU resources.
//!
//! A plain lifetime-tagged index per resource kind works fine for an
//! arena that never frees individual slots, but this core's handle
//! classes are destroyed and recreated constantly across a game's
//! lifetime (level loads, transient texture churn), so each index
//! carries a generation counter: a stale handle into a reused slot
//! compares unequal to the fresh one.

use std::fmt;
use std::marker::PhantomData;

/// The raw (class-erased) bit pattern of a handle: a dense index plus a
/// reuse (generation) counter. `index == INVALID_INDEX` marks the
/// sentinel "invalid handle" value.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawHandle {
    pub index: u32,
    pub generation: u32,
}

const INVALID_INDEX: u32 = u32::max_value();

impl RawHandle {
    pub const INVALID: RawHandle = RawHandle { index: INVALID_INDEX, generation: 0 };

    pub fn is_valid(&self) -> bool {
        self.index != INVALID_INDEX
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}g{}", self.index, self.generation)
        } else {
            write!(f, "#invalid")
        }
    }
}

impl Default for RawHandle {
    fn default() -> Self {
        RawHandle::INVALID
    }
}

/// A typed wrapper around [`RawHandle`], distinguishing resource classes
/// at the type level with a zero-cost newtype, plus the generation
/// counter that gives destroyed handles a way to compare unequal to a
/// freshly minted one at the same index.
#[repr(transparent)]
pub struct Handle<Class> {
    pub raw: RawHandle,
    _class: PhantomData<Class>,
}

impl<Class> Handle<Class> {
    pub fn new(raw: RawHandle) -> Self {
        Handle { raw, _class: PhantomData }
    }

    pub fn invalid() -> Self {
        Handle::new(RawHandle::INVALID)
    }

    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }
}

impl<Class> Copy for Handle<Class> {}
impl<Class> Clone for Handle<Class> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Class> PartialEq for Handle<Class> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<Class> Eq for Handle<Class> {}
impl<Class> fmt::Debug for Handle<Class> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}
impl<Class> Default for Handle<Class> {
    fn default() -> Self {
        Handle::invalid()
    }
}

pub enum VertexBufferClass {}
pub enum IndexBufferClass {}
pub enum TextureClass {}
pub enum ShaderClass {}
pub enum ProgramClass {}
pub enum UniformClass {}
pub enum RenderTargetClass {}

pub type VertexBufferHandle = Handle<VertexBufferClass>;
pub type IndexBufferHandle = Handle<IndexBufferClass>;
pub type TextureHandle = Handle<TextureClass>;
pub type ShaderHandle = Handle<ShaderClass>;
pub type ProgramHandle = Handle<ProgramClass>;
pub type UniformHandle = Handle<UniformClass>;
pub type RenderTargetHandle = Handle<RenderTargetClass>;

#[derive(Copy, Clone, PartialEq, Eq)]
enum SlotState {
    Free,
    Live,
}

/// Fixed-capacity, free-list-backed allocator for one resource class.
///
/// `create()` is O(1): it pops the free list if non-empty, else bumps a
/// high-water mark; both paths are bounded by `capacity`. `destroy()`
/// pushes the slot back onto the free list and bumps its generation so
/// a handle minted before the destroy can never alias one minted after.
pub struct HandleTable<Class> {
    class_name: &'static str,
    capacity: usize,
    generations: Vec<u32>,
    states: Vec<SlotState>,
    free_list: Vec<u32>,
    high_water: u32,
    live_count: usize,
    _class: PhantomData<Class>,
}

impl<Class> HandleTable<Class> {
    pub fn new(class_name: &'static str, capacity: usize) -> Self {
        HandleTable {
            class_name,
            capacity,
            generations: vec![0; capacity],
            states: vec![SlotState::Free; capacity],
            free_list: Vec::new(),
            high_water: 0,
            live_count: 0,
            _class: PhantomData,
        }
    }

    /// Mints a fresh handle, or panics with `<Exhausted>` if the pool is
    /// full. Only ever called from the submit thread.
    pub fn create(&mut self) -> Handle<Class> {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else if (self.high_water as usize) < self.capacity {
            let index = self.high_water;
            self.high_water += 1;
            index
        } else {
            crate::error::fatal_exhausted(self.class_name, self.capacity);
        };

        self.states[index as usize] = SlotState::Live;
        self.live_count += 1;

        if self.live_count * 10 >= self.capacity * 9 {
            log::warn!(
                "{} pool is at {}/{} capacity",
                self.class_name,
                self.live_count,
                self.capacity
            );
        }

        let handle = Handle::new(RawHandle { index, generation: self.generations[index as usize] });
        log::trace!("{} created: {:?}", self.class_name, handle.raw);
        handle
    }

    /// Marks `handle`'s slot free and advances its generation. Panics
    /// with `<InvalidHandle>` if the handle is not currently live.
    pub fn destroy(&mut self, handle: Handle<Class>) {
        self.assert_live(handle);
        let index = handle.raw.index as usize;
        self.states[index] = SlotState::Free;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push(handle.raw.index);
        self.live_count -= 1;
        log::trace!("{} destroyed: {:?}", self.class_name, handle.raw);
    }

    /// `true` iff `handle` refers to a currently live slot with a
    /// matching generation.
    pub fn has(&self, handle: Handle<Class>) -> bool {
        if !handle.is_valid() {
            return false;
        }
        let index = handle.raw.index as usize;
        index < self.capacity
            && self.states[index] == SlotState::Live
            && self.generations[index] == handle.raw.generation
    }

    /// Panics with `<InvalidHandle>` unless `has(handle)`.
    pub fn assert_live(&self, handle: Handle<Class>) {
        if !self.has(handle) {
            crate::error::fatal_invalid_handle(self.class_name, handle.raw);
        }
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy_roundtrip() {
        let mut table: HandleTable<VertexBufferClass> = HandleTable::new("vertex_buffer", 4);
        let h1 = table.create();
        assert!(table.has(h1));
        table.destroy(h1);
        assert!(!table.has(h1));
    }

    #[test]
    fn stale_handle_after_reuse_is_invalid() {
        let mut table: HandleTable<VertexBufferClass> = HandleTable::new("vertex_buffer", 4);
        let h1 = table.create();
        table.destroy(h1);
        let h2 = table.create();
        // same index, different generation
        assert_eq!(h1.raw.index, h2.raw.index);
        assert_ne!(h1.raw.generation, h2.raw.generation);
        assert!(!table.has(h1));
        assert!(table.has(h2));
    }

    #[test]
    #[should_panic(expected = "<Exhausted>")]
    fn exhausted_pool_panics() {
        let mut table: HandleTable<VertexBufferClass> = HandleTable::new("vertex_buffer", 2);
        let _a = table.create();
        let _b = table.create();
        let _c = table.create();
    }

    #[test]
    #[should_panic(expected = "<InvalidHandle>")]
    fn destroy_unknown_handle_panics() {
        let mut table: HandleTable<VertexBufferClass> = HandleTable::new("vertex_buffer", 2);
        let bogus = Handle::new(RawHandle { index: 0, generation: 0 });
        table.destroy(bogus);
    }
}
