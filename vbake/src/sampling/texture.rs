use super::rgba::{rgba_pixels, RGBA};
use crate::error::Result;
use crate::math::{lerp, Vec2, Vec4};
use std::path::Path;

/// How bilinear lookups treat coordinates outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
}

/// Flat grid of RGBA samples in [0, 1]. Row 0 lies at v = 0, column 0 at u = 0.
///
/// Immutable once built, bakes share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: String,
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
    /// Texels may be sampled. Hosts hand out unreadable textures that must be copied first.
    pub readable: bool,
    pub wrap: WrapMode,
}

impl TextureData {
    pub fn new(name: impl Into<String>, width: u32, height: u32, texels: Vec<Vec4>) -> Self {
        assert!(width > 0);
        assert!(height > 0);
        assert_eq!(texels.len(), width as usize * height as usize);
        Self { name: name.into(), width, height, texels, readable: true, wrap: WrapMode::default() }
    }

    /// Builds a texture from tightly packed RGBA8 bytes, bottom row first.
    pub fn from_rgba8(name: impl Into<String>, width: u32, height: u32, bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), width as usize * height as usize * 4);
        let texels = rgba_pixels(bytes).iter().map(|p| p.to_vec4()).collect();
        Self::new(name, width, height, texels)
    }

    /// Converts a decoded image. Images store their top row first, so rows are flipped.
    pub fn from_image(name: impl Into<String>, image: &image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in (0..height).rev() {
            for x in 0..width {
                let p = image.get_pixel(x, y).0;
                texels.push(RGBA::new(p[0], p[1], p[2], p[3]).to_vec4());
            }
        }
        Self::new(name, width, height, texels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        Ok(Self::from_image(name, &image))
    }

    pub fn solid(name: impl Into<String>, width: u32, height: u32, color: Vec4) -> Self {
        Self::new(name, width, height, vec![color; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        debug_assert!(x < self.width && y < self.height);
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// Mean of all texels.
    pub fn average(&self) -> Vec4 {
        let mut sum = Vec4::ZERO;
        for &t in &self.texels {
            sum += t;
        }
        sum / self.texels.len() as f32
    }

    /// Bilinear lookup with texel centers at `(i + 0.5) / size`.
    pub fn sample_bilinear(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let (xa, xb) = (self.wrap_index(x0, self.width), self.wrap_index(x0 + 1.0, self.width));
        let (ya, yb) = (self.wrap_index(y0, self.height), self.wrap_index(y0 + 1.0, self.height));

        let bottom = lerp(self.texel(xa, ya), self.texel(xb, ya), fx);
        let top = lerp(self.texel(xa, yb), self.texel(xb, yb), fx);
        lerp(bottom, top, fy)
    }

    // Reduced while still a float, so arbitrarily far coordinates stay in range
    fn wrap_index(&self, i: f32, size: u32) -> u32 {
        let i = match self.wrap {
            WrapMode::Repeat => i.rem_euclid(size as f32),
            WrapMode::Clamp => i.clamp(0.0, (size - 1) as f32),
        };
        (i as u32).min(size - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    fn quad() -> TextureData {
        TextureData::new("quad", 2, 2, vec![RED, GREEN, BLUE, Vec4::WHITE])
    }

    fn assert_near(a: Vec4, b: Vec4) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_from_rgba8() {
        let bytes = [255u8, 0, 0, 255, 0, 0, 255, 0];
        let t = TextureData::from_rgba8("t", 2, 1, &bytes);
        assert_eq!(t.texel(0, 0), RED);
        assert_eq!(t.texel(1, 0), Vec4::new(0.0, 0.0, 1.0, 0.0));
        assert!(t.readable);
    }

    #[test]
    fn test_from_image_flips_rows() {
        let mut image = image::RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255])); // top
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255])); // bottom
        let t = TextureData::from_image("img", &image);
        assert_eq!(t.texel(0, 0), BLUE);
        assert_eq!(t.texel(0, 1), RED);
    }

    #[test]
    fn test_average() {
        assert_near(quad().average(), Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(TextureData::solid("s", 3, 5, GREEN).average(), GREEN);
    }

    #[test]
    fn test_bilinear_at_texel_centers() {
        let t = quad();
        assert_near(t.sample_bilinear(Vec2::new(0.25, 0.25)), RED);
        assert_near(t.sample_bilinear(Vec2::new(0.75, 0.25)), GREEN);
        assert_near(t.sample_bilinear(Vec2::new(0.25, 0.75)), BLUE);
        assert_near(t.sample_bilinear(Vec2::new(0.75, 0.75)), Vec4::WHITE);
    }

    #[test]
    fn test_bilinear_center_blends_all_four() {
        assert_near(quad().sample_bilinear(Vec2::new(0.5, 0.5)), Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_bilinear_wrap_modes() {
        let mut t = quad();
        // half way between the right column and the wrapped-around left column
        assert_near(t.sample_bilinear(Vec2::new(1.0, 0.25)), Vec4::new(0.5, 0.5, 0.0, 1.0));
        t.wrap = WrapMode::Clamp;
        assert_near(t.sample_bilinear(Vec2::new(1.0, 0.25)), GREEN);
        assert_near(t.sample_bilinear(Vec2::new(-3.0, 0.25)), RED);
    }

    #[test]
    fn test_bilinear_far_outside() {
        let red = TextureData::solid("red", 4, 4, RED);
        assert_eq!(red.sample_bilinear(Vec2::new(1e20, 0.5)), RED);
        assert_eq!(red.sample_bilinear(Vec2::new(-1e20, -3e19)), RED);

        let mut clamped = quad();
        clamped.wrap = WrapMode::Clamp;
        assert_eq!(clamped.sample_bilinear(Vec2::new(1e20, -1e20)), GREEN);
        assert_eq!(clamped.sample_bilinear(Vec2::new(-1e20, 1e20)), BLUE);
    }

    #[test]
    #[should_panic]
    fn test_new_rejects_size_mismatch() {
        TextureData::new("bad", 2, 2, vec![RED]);
    }
}
