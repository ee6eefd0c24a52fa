use super::adjust::ColorAdjustment;
use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::math::*;
use crate::mesh::{MeshData, MeshDataSection};
use crate::progress::ProgressSink;
use crate::sampling::{TextureData, TriangleSampler};

/// Turns a textured mesh into a vertex-colored one, one flat color per triangle.
///
/// Every triangle gets three fresh vertices so neighbouring faces never share a color. Meshes whose
/// UVs leave the unit square are treated as tiling: the whole texture is averaged once and that
/// color goes to every triangle with alpha 0, marking it as a replacement rather than a blend.
pub struct TriangleBaker<'a> {
    texture: Option<&'a TextureData>,
    tint: Vec4,
    adjustment: ColorAdjustment,
    keep_old_colors: bool,
}

impl<'a> TriangleBaker<'a> {
    pub fn new(texture: Option<&'a TextureData>, tint: Vec4, adjustment: ColorAdjustment, keep_old_colors: bool) -> Self {
        Self { texture, tint, adjustment, keep_old_colors }
    }

    pub fn from_config(config: &BakeConfig, texture: Option<&'a TextureData>, tint: Vec4) -> Self {
        Self::new(texture, tint, ColorAdjustment::from(&config.texture), config.keep_old_colors)
    }

    /// Color of one triangle of a non-tiling mesh. Without a texture the tint is used unadjusted.
    pub fn triangle_color(&self, uv0: Vec2, uv1: Vec2, uv2: Vec2) -> Vec4 {
        match self.texture {
            Some(texture) => {
                let sampled = TriangleSampler::new(texture).sample(uv0, uv1, uv2);
                self.adjustment.apply(sampled * self.tint)
            }
            None => self.tint,
        }
    }

    /// Color of every triangle of a tiling mesh.
    pub fn flat_color(&self) -> Vec4 {
        match self.texture {
            Some(texture) => self.adjustment.apply(texture.average() * self.tint).with_w(0.0),
            None => self.tint.with_w(0.0),
        }
    }

    pub fn bake(&self, mesh: &MeshData, progress: &mut dyn ProgressSink) -> Result<MeshData> {
        if !mesh.has_tex_coords() {
            return Err(BakeError::MissingUvChannel { mesh: mesh.name.clone() });
        }
        mesh.validate()?;

        let flat = if mesh.has_tiling_uvs() {
            log::debug!("mesh '{}' has tiling UVs, using the texture average", mesh.name);
            Some(self.flat_color())
        } else {
            None
        };
        let blend = self.keep_old_colors && mesh.has_colors() && flat.is_none();
        if blend {
            log::debug!("mesh '{}' keeps its existing vertex colors", mesh.name);
        }

        let triangles = mesh.triangle_count();
        let has_lightmap = mesh.has_lightmap_coords();
        let mut out = MeshData {
            name: mesh.name.clone(),
            readable: mesh.readable,
            positions: Vec::with_capacity(triangles * 3),
            tex_coords: Vec::with_capacity(triangles * 3),
            colors: Vec::with_capacity(triangles * 3),
            indices: Vec::with_capacity(triangles * 3),
            ..Default::default()
        };

        let label = format!("Baking {}", mesh.name);
        for (t, tri) in mesh.indices.chunks_exact(3).enumerate() {
            let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let color = match flat {
                Some(c) => c,
                None => self.triangle_color(
                    mesh.tex_coords[corners[0]],
                    mesh.tex_coords[corners[1]],
                    mesh.tex_coords[corners[2]],
                ),
            };

            for i in corners {
                out.indices.push(out.positions.len() as u32);
                out.positions.push(mesh.positions[i]);
                out.tex_coords.push(mesh.tex_coords[i]);
                if has_lightmap {
                    out.lightmap_coords.push(mesh.lightmap_coords[i]);
                }
                out.colors.push(if blend { blend_colors(mesh.colors[i], color) } else { color });
            }

            progress.report(&label, (t + 1) as f32 / triangles as f32);
        }

        out.sections = vec![MeshDataSection { start_index: 0, num_triangles: triangles, material_index: 0 }];
        out.recalculate_derived();
        Ok(out)
    }
}

/// Multiplies a new color onto an existing one, keeping the existing alpha.
pub fn blend_colors(existing: Vec4, new: Vec4) -> Vec4 {
    (existing * new).with_w(existing.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

    fn quad_texture() -> TextureData {
        TextureData::new("quad", 2, 2, vec![RED, GREEN, BLUE, Vec4::WHITE])
    }

    fn triangle(uvs: [Vec2; 3]) -> MeshData {
        MeshData::new(
            "tri",
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            uvs.to_vec(),
            vec![0, 1, 2],
        )
    }

    fn lower_left() -> [Vec2; 3] {
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)]
    }

    fn assert_near(a: Vec4, b: Vec4) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_bake_2x2_lower_left() {
        let texture = quad_texture();
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = baker.bake(&triangle(lower_left()), &mut NoProgress).unwrap();
        assert_eq!(baked.vertex_count(), 3);
        for c in &baked.colors {
            assert_near(*c, Vec4::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0));
        }
    }

    #[test]
    fn test_splits_shared_vertices() {
        let texture = quad_texture();
        let mesh = MeshData::new(
            "quad",
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
            vec![0, 1, 2, 0, 2, 3],
        );
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = baker.bake(&mesh, &mut NoProgress).unwrap();
        assert_eq!(baked.vertex_count(), 6);
        assert_eq!(baked.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(baked.tex_coords[4], mesh.tex_coords[2]);
        assert_eq!(baked.normals.len(), 6);
        assert!(baked.validate().is_ok());
    }

    #[test]
    fn test_tint_multiplies_before_adjust() {
        let texture = TextureData::solid("gray", 2, 2, Vec4::new(0.5, 0.5, 0.5, 1.0));
        let tint = Vec4::new(1.0, 0.5, 0.0, 1.0);
        let baker = TriangleBaker::new(Some(&texture), tint, ColorAdjustment::IDENTITY, false);
        assert_near(baker.triangle_color(lower_left()[0], lower_left()[1], lower_left()[2]), Vec4::new(0.5, 0.25, 0.0, 1.0));
    }

    #[test]
    fn test_no_texture_uses_tint_as_is() {
        let tint = Vec4::new(0.2, 0.3, 0.4, 0.9);
        let adjustment = ColorAdjustment { strength: 0.5, contrast: 2.0, brightness: 0.1 };
        let baker = TriangleBaker::new(None, tint, adjustment, false);
        let baked = baker.bake(&triangle(lower_left()), &mut NoProgress).unwrap();
        assert_eq!(baked.colors, vec![tint; 3]);
    }

    #[test]
    fn test_tiling_mesh_gets_flat_color_with_zero_alpha() {
        let texture = quad_texture();
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, true);
        let mut mesh = triangle([Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0)]);
        mesh.colors = vec![RED; 3];
        let baked = baker.bake(&mesh, &mut NoProgress).unwrap();
        for c in &baked.colors {
            assert_near(*c, Vec4::new(0.5, 0.5, 0.5, 0.0));
        }

        let untextured = TriangleBaker::new(None, GREEN, ColorAdjustment::IDENTITY, false);
        assert_eq!(untextured.flat_color(), Vec4::new(0.0, 1.0, 0.0, 0.0));
    }

    #[test]
    fn test_keep_old_colors_multiplies_and_keeps_alpha() {
        let texture = TextureData::solid("gray", 2, 2, Vec4::new(0.5, 0.5, 0.5, 1.0));
        let mut mesh = triangle(lower_left());
        mesh.colors = vec![Vec4::new(1.0, 0.5, 0.0, 0.25); 3];

        let keep = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, true);
        let baked = keep.bake(&mesh, &mut NoProgress).unwrap();
        assert_near(baked.colors[0], Vec4::new(0.5, 0.25, 0.0, 0.25));

        let replace = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = replace.bake(&mesh, &mut NoProgress).unwrap();
        assert_near(baked.colors[0], Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_missing_uvs() {
        let mut mesh = triangle(lower_left());
        mesh.tex_coords.clear();
        let baker = TriangleBaker::new(None, Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        assert!(matches!(baker.bake(&mesh, &mut NoProgress), Err(BakeError::MissingUvChannel { .. })));
    }

    #[test]
    fn test_progress_per_triangle() {
        struct Recorder(Vec<f32>);
        impl ProgressSink for Recorder {
            fn report(&mut self, _label: &str, fraction: f32) {
                self.0.push(fraction);
            }
        }

        let mesh = MeshData::new("two", vec![Vec3::default(); 3], vec![Vec2::default(); 3], vec![0, 1, 2, 2, 1, 0]);
        let baker = TriangleBaker::new(None, Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let mut recorder = Recorder(Vec::new());
        baker.bake(&mesh, &mut recorder).unwrap();
        assert_eq!(recorder.0, vec![0.5, 1.0]);
    }
}
