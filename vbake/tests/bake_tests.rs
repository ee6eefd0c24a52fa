use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vbake::bake::*;
use vbake::math::*;
use vbake::mesh::*;
use vbake::sampling::*;

macro_rules! assert_color_eq {
    ($left:expr, $right:expr, $tol:expr $(,)?) => {{
        let l: Vec4 = $left;
        let r: Vec4 = $right;
        let tol: f32 = $tol;
        if (l.x - r.x).abs() > tol || (l.y - r.y).abs() > tol || (l.z - r.z).abs() > tol || (l.w - r.w).abs() > tol {
            panic!("assertion failed: left != right within tol={}\n  left: {:?}\n right: {:?}", tol, l, r);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vbake::NoProgress;

    fn noise_texture(rng: &mut StdRng, w: u32, h: u32) -> TextureData {
        let texels = (0..w * h)
            .map(|_| Vec4::new(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>(), 1.0))
            .collect();
        TextureData::new("noise", w, h, texels)
    }

    // Multiples of 1/256 on a texel grid of 1/(2^n) steps, so edge hits are decided exactly by both
    // containment tests
    fn random_uv(rng: &mut StdRng) -> Vec2 {
        let mut coord = || rng.random_range(-51..=307) as f32 / 256.0;
        Vec2::new(coord(), coord())
    }

    // Containment from f64 barycentric weights, independent of the edge-function test
    fn contains(p: Vec2, p0: Vec2, p1: Vec2, p2: Vec2) -> bool {
        let (px, py) = (p.x as f64, p.y as f64);
        let (x0, y0, x1, y1, x2, y2) = (p0.x as f64, p0.y as f64, p1.x as f64, p1.y as f64, p2.x as f64, p2.y as f64);
        let den = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);
        if den == 0.0 {
            return false;
        }
        // weights are a/den, b/den, c/den; all in [0, 1] iff the numerators share the sign of den
        let a = (y1 - y2) * (px - x2) + (x2 - x1) * (py - y2);
        let b = (y2 - y0) * (px - x2) + (x0 - x2) * (py - y2);
        let c = den - a - b;
        let sign = den.signum();
        a * sign >= 0.0 && b * sign >= 0.0 && c * sign >= 0.0
    }

    // Tests every texel of the texture, no bounding box
    fn brute_force(texture: &TextureData, uv0: Vec2, uv1: Vec2, uv2: Vec2) -> Vec4 {
        let (w, h) = (texture.width(), texture.height());
        let mut sum = Vec4::ZERO;
        let mut count = 0;
        for y in 0..h {
            for x in 0..w {
                let uv = Vec2::new(x as f32 / (w - 1) as f32, y as f32 / (h - 1) as f32);
                if contains(uv, uv0, uv1, uv2) {
                    sum += texture.texel(x, y);
                    count += 1;
                }
            }
        }
        if count > 0 { sum / count as f32 } else { texture.sample_bilinear((uv0 + uv1 + uv2) / 3.0) }
    }

    #[rstest]
    #[case(1, 17, 17)]
    #[case(2, 33, 9)]
    #[case(3, 65, 65)]
    fn test_sampler_matches_brute_force(#[case] seed: u64, #[case] w: u32, #[case] h: u32) {
        let mut rng = StdRng::seed_from_u64(seed);
        let texture = noise_texture(&mut rng, w, h);
        let sampler = TriangleSampler::new(&texture);
        for _ in 0..200 {
            let (uv0, uv1, uv2) = (random_uv(&mut rng), random_uv(&mut rng), random_uv(&mut rng));
            assert_color_eq!(sampler.sample(uv0, uv1, uv2), brute_force(&texture, uv0, uv1, uv2), 1e-5);
        }
    }

    #[test]
    fn test_sampler_ignores_vertex_order() {
        let mut rng = StdRng::seed_from_u64(9);
        let texture = noise_texture(&mut rng, 33, 33);
        for _ in 0..100 {
            let (uv0, uv1, uv2) = (random_uv(&mut rng), random_uv(&mut rng), random_uv(&mut rng));
            let a = sample_triangle(&texture, uv0, uv1, uv2);
            assert_color_eq!(a, sample_triangle(&texture, uv2, uv0, uv1), 1e-5);
            assert_color_eq!(a, sample_triangle(&texture, uv1, uv0, uv2), 1e-5);
        }
    }

    #[test]
    fn test_collapsed_uvs_are_one_bilinear_sample() {
        let mut rng = StdRng::seed_from_u64(4);
        let texture = noise_texture(&mut rng, 8, 8);
        for _ in 0..50 {
            let uv = Vec2::new(rng.random::<f32>(), rng.random::<f32>());
            assert_eq!(sample_triangle(&texture, uv, uv, uv), texture.sample_bilinear((uv + uv + uv) / 3.0));
        }
    }

    fn random_mesh(rng: &mut StdRng, grid: usize) -> MeshData {
        let mut positions = Vec::new();
        let mut tex_coords = Vec::new();
        for y in 0..=grid {
            for x in 0..=grid {
                positions.push(Vec3::new(x as f32, y as f32, rng.random_range(0.0..0.1)));
                tex_coords.push(Vec2::new(x as f32 / grid as f32, y as f32 / grid as f32));
            }
        }
        let mut indices = Vec::new();
        let row = grid as u32 + 1;
        for y in 0..grid as u32 {
            for x in 0..grid as u32 {
                let i = y * row + x;
                indices.extend_from_slice(&[i, i + 1, i + row + 1, i, i + row + 1, i + row]);
            }
        }
        MeshData::new("grid", positions, tex_coords, indices)
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.1)]
    #[case(0.5)]
    #[case(10.0)]
    fn test_optimizer_keeps_triangle_count(#[case] threshold: f32) {
        let mut rng = StdRng::seed_from_u64(5);
        let texture = noise_texture(&mut rng, 16, 16);
        let mesh = random_mesh(&mut rng, 6);
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = baker.bake(&mesh, &mut NoProgress).unwrap();

        let optimized = optimize_vertices(&baked, threshold, &mut NoProgress).unwrap();
        assert_eq!(optimized.triangle_count(), baked.triangle_count());
        assert!(optimized.vertex_count() <= baked.vertex_count());
        assert!(optimized.vertex_count() >= mesh.vertex_count());
        assert!(optimized.validate().is_ok());
    }

    #[test]
    fn test_optimizer_merges_everything_on_flat_color() {
        let mut rng = StdRng::seed_from_u64(6);
        let mesh = random_mesh(&mut rng, 4);
        let texture = TextureData::solid("flat", 4, 4, Vec4::new(0.3, 0.6, 0.9, 1.0));
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = baker.bake(&mesh, &mut NoProgress).unwrap();
        assert_eq!(baked.vertex_count(), mesh.triangle_count() * 3);
        assert_eq!(optimize_vertices(&baked, 0.001, &mut NoProgress).unwrap().vertex_count(), mesh.vertex_count());
    }

    #[test]
    fn test_filters_on_baked_mesh() {
        let mut rng = StdRng::seed_from_u64(7);
        let texture = noise_texture(&mut rng, 16, 16);
        let mesh = random_mesh(&mut rng, 3);
        let baker = TriangleBaker::new(Some(&texture), Vec4::WHITE, ColorAdjustment::IDENTITY, false);
        let baked = baker.bake(&mesh, &mut NoProgress).unwrap();

        let mut colors = baked.colors.clone();
        average_colors(&mut colors, 0.0);
        assert_eq!(colors, baked.colors);

        // Split corners share a position, radius 0 pulls their copies together
        average_neighbor_colors(&baked.positions, &mut colors, 0.0, 1.0, &mut NoProgress);
        for (i, j) in [(0, 3), (2, 4)] {
            assert_eq!(baked.positions[i], baked.positions[j]);
            assert_color_eq!(colors[i], colors[j], 1e-5);
        }

        let mut colors = baked.colors.clone();
        average_colors(&mut colors, 1.0);
        let first = colors[0];
        for &c in &colors {
            assert_color_eq!(c, first, 1e-5);
        }
    }

    #[test]
    fn test_neighbor_radius_zero_on_unique_positions() {
        let mut rng = StdRng::seed_from_u64(8);
        let mesh = random_mesh(&mut rng, 5);
        let colors: Vec<Vec4> = (0..mesh.vertex_count()).map(|_| Vec4::new(rng.random(), rng.random(), rng.random(), 1.0)).collect();
        let mut filtered = colors.clone();
        average_neighbor_colors(&mesh.positions, &mut filtered, 0.0, 1.0, &mut NoProgress);
        assert_eq!(filtered, colors);
    }

    #[rstest]
    #[case(Vec4::new(0.5, 0.5, 0.5, 1.0), Vec4::new(0.55, 0.55, 0.55, 1.0), 0.1, true)]
    #[case(Vec4::new(0.5, 0.5, 0.5, 1.0), Vec4::new(0.55, 0.55, 0.55, 1.0), 0.02, false)]
    #[case(Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(1.0, 0.0, 0.1, 1.0), 0.05, true)]
    #[case(Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 1.0), 0.3, false)]
    fn test_color_similarity(#[case] a: Vec4, #[case] b: Vec4, #[case] threshold: f32, #[case] similar: bool) {
        assert_eq!(is_color_similar(a, b, threshold), similar);
        assert_eq!(is_color_similar(b, a, threshold), similar);
    }

    #[test]
    fn test_split_bake_combine_roundtrip() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut mesh = random_mesh(&mut rng, 2);
        mesh.sections = vec![
            MeshDataSection { start_index: 0, num_triangles: 3, material_index: 0 },
            MeshDataSection { start_index: 9, num_triangles: 5, material_index: 1 },
        ];
        assert!(mesh.validate().is_ok());

        let baker = TriangleBaker::new(None, Vec4::new(0.2, 0.4, 0.6, 1.0), ColorAdjustment::IDENTITY, false);
        let parts: Vec<MeshData> = (0..2).map(|i| baker.bake(&extract_section(&mesh, i), &mut NoProgress).unwrap()).collect();
        let combined = combine(&parts).unwrap();
        assert_eq!(combined.triangle_count(), mesh.triangle_count());
        assert_eq!(combined.vertex_count(), mesh.triangle_count() * 3);
        assert!(combined.validate().is_ok());
    }
}
