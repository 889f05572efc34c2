//! Bit-packed fixed-function state words.
//!
//! Bit-for-bit grounded on the original engine's `STATE_*` /
//! `TEXTURE_*` / `SAMPLER_*` `#define`s in
//! `engine/renderers/RenderContext.h`, re-packed into the narrower
//! layout this core's draws actually need.

use bitflags::bitflags;

bitflags! {
    /// Bits 0..3: write masks. Matches the original's
    /// `STATE_DEPTH_WRITE`/`STATE_COLOR_WRITE`/`STATE_ALPHA_WRITE`.
    #[derive(Default)]
    pub struct WriteMask: u64 {
        const DEPTH = 0x1;
        const COLOR = 0x2;
        const ALPHA = 0x4;
    }
}

bitflags! {
    /// Bits 8..11: one enable bit per texture unit (up to 4 units).
    #[derive(Default)]
    pub struct TextureEnableMask: u64 {
        const UNIT_0 = 0x100;
        const UNIT_1 = 0x200;
        const UNIT_2 = 0x400;
        const UNIT_3 = 0x800;
    }
}

pub const MAX_TEXTURE_UNITS: usize = 4;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CullMode {
    None = 0,
    Clockwise = 1,
    CounterClockwise = 2,
}

const CULL_SHIFT: u32 = 4;
const CULL_MASK: u64 = 0x3 << CULL_SHIFT;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Triangles = 0,
    Points = 1,
    Lines = 2,
}

const PRIMITIVE_SHIFT: u32 = 12;
const PRIMITIVE_MASK: u64 = 0xF << PRIMITIVE_SHIFT;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFunc {
    Zero = 0,
    One = 1,
    SrcColor = 2,
    OneMinusSrcColor = 3,
    SrcAlpha = 4,
    OneMinusSrcAlpha = 5,
    DstAlpha = 6,
    OneMinusDstAlpha = 7,
}

const BLEND_SRC_SHIFT: u32 = 16;
const BLEND_SRC_MASK: u64 = 0xF << BLEND_SRC_SHIFT;
const BLEND_DST_SHIFT: u32 = 20;
const BLEND_DST_MASK: u64 = 0xF << BLEND_DST_SHIFT;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendEquation {
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
}

const BLEND_EQ_SHIFT: u32 = 24;
const BLEND_EQ_MASK: u64 = 0xF << BLEND_EQ_SHIFT;

#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DepthFunc {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterEqual = 6,
    Always = 7,
}

const DEPTH_FUNC_SHIFT: u32 = 28;
const DEPTH_FUNC_MASK: u64 = 0xF << DEPTH_FUNC_SHIFT;

/// The full 64-bit render-state word. Copy, cheap, and stable across
/// frames until a producer overwrites it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderState(pub u64);

impl Default for RenderState {
    fn default() -> Self {
        RenderState(0)
    }
}

impl RenderState {
    pub fn write_mask(self) -> WriteMask {
        WriteMask::from_bits_truncate(self.0 & WriteMask::all().bits())
    }

    pub fn with_write_mask(mut self, mask: WriteMask) -> Self {
        self.0 = (self.0 & !WriteMask::all().bits()) | mask.bits();
        self
    }

    pub fn cull_mode(self) -> CullMode {
        match (self.0 & CULL_MASK) >> CULL_SHIFT {
            0 => CullMode::None,
            1 => CullMode::Clockwise,
            _ => CullMode::CounterClockwise,
        }
    }

    pub fn with_cull_mode(mut self, mode: CullMode) -> Self {
        self.0 = (self.0 & !CULL_MASK) | ((mode as u64) << CULL_SHIFT);
        self
    }

    pub fn texture_enable_mask(self) -> TextureEnableMask {
        TextureEnableMask::from_bits_truncate(self.0 & TextureEnableMask::all().bits())
    }

    pub fn with_texture_enable_mask(mut self, mask: TextureEnableMask) -> Self {
        self.0 = (self.0 & !TextureEnableMask::all().bits()) | mask.bits();
        self
    }

    pub fn primitive_topology(self) -> PrimitiveTopology {
        match (self.0 & PRIMITIVE_MASK) >> PRIMITIVE_SHIFT {
            0 => PrimitiveTopology::Triangles,
            1 => PrimitiveTopology::Points,
            _ => PrimitiveTopology::Lines,
        }
    }

    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.0 = (self.0 & !PRIMITIVE_MASK) | ((topology as u64) << PRIMITIVE_SHIFT);
        self
    }

    pub fn blend_src_func(self) -> BlendFunc {
        blend_func_from_bits((self.0 & BLEND_SRC_MASK) >> BLEND_SRC_SHIFT)
    }

    pub fn with_blend_src_func(mut self, func: BlendFunc) -> Self {
        self.0 = (self.0 & !BLEND_SRC_MASK) | ((func as u64) << BLEND_SRC_SHIFT);
        self
    }

    pub fn blend_dst_func(self) -> BlendFunc {
        blend_func_from_bits((self.0 & BLEND_DST_MASK) >> BLEND_DST_SHIFT)
    }

    pub fn with_blend_dst_func(mut self, func: BlendFunc) -> Self {
        self.0 = (self.0 & !BLEND_DST_MASK) | ((func as u64) << BLEND_DST_SHIFT);
        self
    }

    pub fn blend_equation(self) -> BlendEquation {
        match (self.0 & BLEND_EQ_MASK) >> BLEND_EQ_SHIFT {
            0 => BlendEquation::Add,
            1 => BlendEquation::Subtract,
            _ => BlendEquation::ReverseSubtract,
        }
    }

    pub fn with_blend_equation(mut self, eq: BlendEquation) -> Self {
        self.0 = (self.0 & !BLEND_EQ_MASK) | ((eq as u64) << BLEND_EQ_SHIFT);
        self
    }

    pub fn depth_func(self) -> DepthFunc {
        match (self.0 & DEPTH_FUNC_MASK) >> DEPTH_FUNC_SHIFT {
            0 => DepthFunc::Never,
            1 => DepthFunc::Less,
            2 => DepthFunc::Equal,
            3 => DepthFunc::LessEqual,
            4 => DepthFunc::Greater,
            5 => DepthFunc::NotEqual,
            6 => DepthFunc::GreaterEqual,
            _ => DepthFunc::Always,
        }
    }

    pub fn with_depth_func(mut self, func: DepthFunc) -> Self {
        self.0 = (self.0 & !DEPTH_FUNC_MASK) | ((func as u64) << DEPTH_FUNC_SHIFT);
        self
    }
}

fn blend_func_from_bits(bits: u64) -> BlendFunc {
    match bits {
        0 => BlendFunc::Zero,
        1 => BlendFunc::One,
        2 => BlendFunc::SrcColor,
        3 => BlendFunc::OneMinusSrcColor,
        4 => BlendFunc::SrcAlpha,
        5 => BlendFunc::OneMinusSrcAlpha,
        6 => BlendFunc::DstAlpha,
        _ => BlendFunc::OneMinusDstAlpha,
    }
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest = 0,
    Linear = 1,
    Bilinear = 2,
    Trilinear = 3,
}

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureWrap {
    Clamp = 0,
    Repeat = 1,
    Mirror = 2,
}

const SAMPLER_FILTER_SHIFT: u32 = 0;
const SAMPLER_FILTER_MASK: u32 = 0xF;
const SAMPLER_WRAP_U_SHIFT: u32 = 4;
const SAMPLER_WRAP_U_MASK: u32 = 0xF0;
const SAMPLER_WRAP_V_SHIFT: u32 = 8;
const SAMPLER_WRAP_V_MASK: u32 = 0xF00;
/// Marks the slot as carrying a sampler binding, mirroring the original's
/// `SAMPLER_TEXTURE` tag bit.
const SAMPLER_TAG_BIT: u32 = 0x1000_0000;

/// The 32-bit sampler/texture state word.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SamplerState(pub u32);

impl SamplerState {
    pub fn filter(self) -> TextureFilter {
        match (self.0 & SAMPLER_FILTER_MASK) >> SAMPLER_FILTER_SHIFT {
            0 => TextureFilter::Nearest,
            1 => TextureFilter::Linear,
            2 => TextureFilter::Bilinear,
            _ => TextureFilter::Trilinear,
        }
    }

    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.0 = (self.0 & !SAMPLER_FILTER_MASK) | ((filter as u32) << SAMPLER_FILTER_SHIFT);
        self
    }

    pub fn wrap_u(self) -> TextureWrap {
        wrap_from_bits((self.0 & SAMPLER_WRAP_U_MASK) >> SAMPLER_WRAP_U_SHIFT)
    }

    pub fn with_wrap_u(mut self, wrap: TextureWrap) -> Self {
        self.0 = (self.0 & !SAMPLER_WRAP_U_MASK) | ((wrap as u32) << SAMPLER_WRAP_U_SHIFT);
        self
    }

    pub fn wrap_v(self) -> TextureWrap {
        wrap_from_bits((self.0 & SAMPLER_WRAP_V_MASK) >> SAMPLER_WRAP_V_SHIFT)
    }

    pub fn with_wrap_v(mut self, wrap: TextureWrap) -> Self {
        self.0 = (self.0 & !SAMPLER_WRAP_V_MASK) | ((wrap as u32) << SAMPLER_WRAP_V_SHIFT);
        self
    }

    pub fn is_sampler(self) -> bool {
        self.0 & SAMPLER_TAG_BIT != 0
    }

    pub fn with_sampler_tag(mut self) -> Self {
        self.0 |= SAMPLER_TAG_BIT;
        self
    }
}

fn wrap_from_bits(bits: u32) -> TextureWrap {
    match bits {
        0 => TextureWrap::Clamp,
        1 => TextureWrap::Repeat,
        _ => TextureWrap::Mirror,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mask_roundtrip() {
        let s = RenderState::default().with_write_mask(WriteMask::COLOR | WriteMask::DEPTH);
        assert!(s.write_mask().contains(WriteMask::COLOR));
        assert!(s.write_mask().contains(WriteMask::DEPTH));
        assert!(!s.write_mask().contains(WriteMask::ALPHA));
    }

    #[test]
    fn fields_do_not_alias() {
        let s = RenderState::default()
            .with_write_mask(WriteMask::all())
            .with_cull_mode(CullMode::Clockwise)
            .with_primitive_topology(PrimitiveTopology::Lines)
            .with_blend_src_func(BlendFunc::SrcAlpha)
            .with_blend_dst_func(BlendFunc::OneMinusSrcAlpha)
            .with_blend_equation(BlendEquation::Subtract)
            .with_depth_func(DepthFunc::LessEqual);

        assert_eq!(s.write_mask(), WriteMask::all());
        assert_eq!(s.cull_mode(), CullMode::Clockwise);
        assert_eq!(s.primitive_topology(), PrimitiveTopology::Lines);
        assert_eq!(s.blend_src_func(), BlendFunc::SrcAlpha);
        assert_eq!(s.blend_dst_func(), BlendFunc::OneMinusSrcAlpha);
        assert_eq!(s.blend_equation(), BlendEquation::Subtract);
        assert_eq!(s.depth_func(), DepthFunc::LessEqual);
    }

    #[test]
    fn sampler_state_roundtrip() {
        let s = SamplerState::default()
            .with_filter(TextureFilter::Trilinear)
            .with_wrap_u(TextureWrap::Repeat)
            .with_wrap_v(TextureWrap::Mirror)
            .with_sampler_tag();
        assert_eq!(s.filter(), TextureFilter::Trilinear);
        assert_eq!(s.wrap_u(), TextureWrap::Repeat);
        assert_eq!(s.wrap_v(), TextureWrap::Mirror);
        assert!(s.is_sampler());
    }
}
