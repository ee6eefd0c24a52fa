use crate::math::Vec4;
use bytemuck::{Pod, Zeroable};

/// 8-bit RGBA pixel, layout-compatible with tightly packed RGBA8 byte buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Zeroable, Pod)]
pub struct RGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RGBA {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0, self.a as f32 / 255.0)
    }

    /// Quantizes a [0, 1] color, clamping out-of-range channels.
    pub fn from_vec4(color: Vec4) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { r: q(color.x), g: q(color.y), b: q(color.z), a: q(color.w) }
    }
}

/// Reinterprets a packed RGBA8 byte buffer as pixels without copying.
pub fn rgba_pixels(bytes: &[u8]) -> &[RGBA] {
    bytemuck::cast_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec4_conversion() {
        assert_eq!(RGBA::new(255, 0, 255, 0).to_vec4(), Vec4::new(1.0, 0.0, 1.0, 0.0));
        assert_eq!(RGBA::from_vec4(Vec4::new(1.0, 0.5, 0.0, 1.0)), RGBA::new(255, 128, 0, 255));
        assert_eq!(RGBA::from_vec4(Vec4::new(2.0, -1.0, 0.0, 1.0)), RGBA::new(255, 0, 0, 255));
    }

    #[test]
    fn test_rgba_pixels() {
        let bytes = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let pixels = rgba_pixels(&bytes);
        assert_eq!(pixels, &[RGBA::new(10, 20, 30, 40), RGBA::new(50, 60, 70, 80)]);
    }
}
