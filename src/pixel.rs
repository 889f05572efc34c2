//! Pixel formats, grounded on `engine/renderers/backend/PixelFormat.h`.
//!
//! The original expresses `is_compressed`/`is_color`/`is_depth` as range
//! checks against the enum's declaration order (`is_compressed = fmt <
//! R8G8B8`, `is_color = R8G8B8 <= fmt < D16`, `is_depth = D16 <= fmt <
//! COUNT`); this enum preserves that declaration order so the same
//! range-check idiom applies.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PixelFormat {
    Dxt1 = 0,
    Dxt3,
    Dxt5,
    R8G8B8,
    R8G8B8A8,
    D16,
    D24,
    D32,
    D24S8,
}

const COMPRESSED_BOUNDARY: PixelFormat = PixelFormat::R8G8B8;
const DEPTH_BOUNDARY: PixelFormat = PixelFormat::D16;

impl PixelFormat {
    /// Bytes per pixel for uncompressed formats; for compressed formats,
    /// bytes per 4x4 block (the conventional DXT block size).
    pub fn size_bytes(self) -> u32 {
        match self {
            PixelFormat::Dxt1 => 8,
            PixelFormat::Dxt3 | PixelFormat::Dxt5 => 16,
            PixelFormat::R8G8B8 => 3,
            PixelFormat::R8G8B8A8 => 4,
            PixelFormat::D16 => 2,
            PixelFormat::D24 | PixelFormat::D32 | PixelFormat::D24S8 => 4,
        }
    }

    pub fn is_compressed(self) -> bool {
        self < COMPRESSED_BOUNDARY
    }

    pub fn is_color(self) -> bool {
        self >= COMPRESSED_BOUNDARY && self < DEPTH_BOUNDARY
    }

    pub fn is_depth(self) -> bool {
        self >= DEPTH_BOUNDARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_partitions_the_enum() {
        for fmt in &[
            PixelFormat::Dxt1,
            PixelFormat::Dxt3,
            PixelFormat::Dxt5,
            PixelFormat::R8G8B8,
            PixelFormat::R8G8B8A8,
            PixelFormat::D16,
            PixelFormat::D24,
            PixelFormat::D32,
            PixelFormat::D24S8,
        ] {
            let count = [fmt.is_compressed(), fmt.is_color(), fmt.is_depth()]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(count, 1, "{:?} should match exactly one classification", fmt);
        }
    }

    #[test]
    fn dxt1_is_compressed() {
        assert!(PixelFormat::Dxt1.is_compressed());
        assert_eq!(PixelFormat::Dxt1.size_bytes(), 8);
    }

    #[test]
    fn d24s8_is_depth() {
        assert!(PixelFormat::D24S8.is_depth());
    }
}
