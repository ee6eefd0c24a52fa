use super::texture::TextureData;
use crate::math::*;

/// Average color of one UV triangle, with the number of texels that contributed to it.
/// `covered == 0` means the centroid fallback was used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleSample {
    pub color: Vec4,
    pub covered: usize,
}

/// Area-accurate texture averaging over UV triangles.
///
/// Texel `(x, y)` sits at UV `(x / (w - 1), y / (h - 1))`, so the corner texels lie exactly on the
/// unit square corners. A texel contributes when its UV lies inside the triangle, edges included.
pub struct TriangleSampler<'a> {
    texture: &'a TextureData,
}

impl<'a> TriangleSampler<'a> {
    pub fn new(texture: &'a TextureData) -> Self {
        Self { texture }
    }

    pub fn sample(&self, uv0: Vec2, uv1: Vec2, uv2: Vec2) -> Vec4 {
        self.sample_detailed(uv0, uv1, uv2).color
    }

    pub fn sample_detailed(&self, uv0: Vec2, uv1: Vec2, uv2: Vec2) -> TriangleSample {
        let mut sum = Vec4::ZERO;
        let mut covered = 0;
        self.for_each_covered(uv0, uv1, uv2, |x, y, _| {
            sum += self.texture.texel(x, y);
            covered += 1;
        });

        if covered > 0 {
            TriangleSample { color: sum / covered as f32, covered }
        } else {
            let centroid = (uv0 + uv1 + uv2) / 3.0;
            TriangleSample { color: self.texture.sample_bilinear(centroid), covered: 0 }
        }
    }

    /// Calls `f(x, y, uv)` for every texel covered by the UV triangle.
    pub fn for_each_covered<F>(&self, uv0: Vec2, uv1: Vec2, uv2: Vec2, mut f: F)
    where
        F: FnMut(u32, u32, Vec2),
    {
        let w = self.texture.width();
        let h = self.texture.height();
        let scale = Vec2::new((w - 1) as f32, (h - 1) as f32);
        let p0 = Vec2::new(uv0.x * scale.x, uv0.y * scale.y);
        let p1 = Vec2::new(uv1.x * scale.x, uv1.y * scale.y);
        let p2 = Vec2::new(uv2.x * scale.x, uv2.y * scale.y);

        // Clamp the bounding box to the texture
        let max_x = (w - 1) as f32;
        let max_y = (h - 1) as f32;
        let min_x = p0.x.min(p1.x).min(p2.x).floor().clamp(0.0, max_x) as u32;
        let max_x = p0.x.max(p1.x).max(p2.x).ceil().clamp(0.0, max_x) as u32;
        let min_y = p0.y.min(p1.y).min(p2.y).floor().clamp(0.0, max_y) as u32;
        let max_y = p0.y.max(p1.y).max(p2.y).ceil().clamp(0.0, max_y) as u32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let uv = Vec2::new(texel_coord(x, w), texel_coord(y, h));
                if is_point_in_triangle(uv, uv0, uv1, uv2) {
                    f(x, y, uv);
                }
            }
        }
    }

    /// Positions on the 3D triangle `(v0, v1, v2)` that correspond to the covered texels.
    /// Useful to visualize which part of a face a color came from.
    pub fn sample_points(&self, uvs: [Vec2; 3], positions: [Vec3; 3]) -> Vec<Vec3> {
        let [uv0, uv1, uv2] = uvs;
        let [v0, v1, v2] = positions;
        let mut points = Vec::new();
        self.for_each_covered(uv0, uv1, uv2, |_, _, uv| {
            if let Some(p) = barycentric_interpolate(uv, uv0, uv1, uv2, v0, v1, v2) {
                points.push(p);
            }
        });
        points
    }
}

/// Average texture color over a UV triangle, see [`TriangleSampler`].
pub fn sample_triangle(texture: &TextureData, uv0: Vec2, uv1: Vec2, uv2: Vec2) -> Vec4 {
    TriangleSampler::new(texture).sample(uv0, uv1, uv2)
}

fn texel_coord(i: u32, size: u32) -> f32 {
    if size > 1 { i as f32 / (size - 1) as f32 } else { 0.0 }
}
