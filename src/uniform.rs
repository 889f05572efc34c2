//! Uniform types and the stock-uniform name table.
//!
//! Grounded on `engine/renderers/backend/RendererTypes.h`'s
//! `UniformType`/`ShaderUniform` enums and
//! `engine/renderers/ConstantBuffer.h`'s `UNIFORM_SIZE_TABLE`, plus
//! `Renderer.h::create_uniform`'s collision check against
//! `name_to_stock_uniform`.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum UniformType {
    Integer1,
    Integer2,
    Integer3,
    Integer4,
    Float1,
    Float2,
    Float3,
    Float4,
    Float3x3,
    Float4x4,
}

impl UniformType {
    /// Element size in bytes, matching `UNIFORM_SIZE_TABLE`.
    pub fn element_size(self) -> usize {
        use UniformType::*;
        match self {
            Integer1 => 4,
            Integer2 => 8,
            Integer3 => 12,
            Integer4 => 16,
            Float1 => 4,
            Float2 => 8,
            Float3 => 12,
            Float4 => 16,
            Float3x3 => 9 * 4,
            Float4x4 => 16 * 4,
        }
    }

    pub fn byte_size(self, count: u32) -> usize {
        self.element_size() * count as usize
    }
}

/// Stock uniforms the core recognizes and binds automatically from
/// layer/draw state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StockUniform {
    View,
    Model,
    ModelView,
    ModelViewProjection,
    TimeSinceStart,
}

impl StockUniform {
    pub fn name(self) -> &'static str {
        match self {
            StockUniform::View => "VIEW",
            StockUniform::Model => "MODEL",
            StockUniform::ModelView => "MODEL_VIEW",
            StockUniform::ModelViewProjection => "MODEL_VIEW_PROJECTION",
            StockUniform::TimeSinceStart => "TIME_SINCE_START",
        }
    }

    /// The type every stock uniform is registered with: a 4x4 matrix for
    /// the pose/view/projection-derived ones, a single float for the
    /// frame clock.
    pub fn ty(self) -> UniformType {
        match self {
            StockUniform::TimeSinceStart => UniformType::Float1,
            _ => UniformType::Float4x4,
        }
    }

    pub const ALL: [StockUniform; 5] = [
        StockUniform::View,
        StockUniform::Model,
        StockUniform::ModelView,
        StockUniform::ModelViewProjection,
        StockUniform::TimeSinceStart,
    ];
}

lazy_static! {
    static ref STOCK_UNIFORM_NAMES: HashMap<&'static str, StockUniform> = {
        let mut m = HashMap::new();
        m.insert(StockUniform::View.name(), StockUniform::View);
        m.insert(StockUniform::Model.name(), StockUniform::Model);
        m.insert(StockUniform::ModelView.name(), StockUniform::ModelView);
        m.insert(StockUniform::ModelViewProjection.name(), StockUniform::ModelViewProjection);
        m.insert(StockUniform::TimeSinceStart.name(), StockUniform::TimeSinceStart);
        m
    };
}

/// Looks up a stock uniform by name, mirroring the original's
/// `name_to_stock_uniform`. Used both to auto-bind stock uniforms per
/// draw and to reject producer-registered names that collide with one.
pub fn name_to_stock_uniform(name: &str) -> Option<StockUniform> {
    STOCK_UNIFORM_NAMES.get(name).copied()
}

pub const MAX_UNIFORM_NAME_LENGTH: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_sizes_match_table() {
        assert_eq!(UniformType::Integer1.element_size(), 4);
        assert_eq!(UniformType::Float4.element_size(), 16);
        assert_eq!(UniformType::Float3x3.element_size(), 36);
        assert_eq!(UniformType::Float4x4.element_size(), 64);
    }

    #[test]
    fn stock_uniform_lookup() {
        assert_eq!(name_to_stock_uniform("MODEL_VIEW_PROJECTION"), Some(StockUniform::ModelViewProjection));
        assert_eq!(name_to_stock_uniform("u_tint"), None);
    }
}
