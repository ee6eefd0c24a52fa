use crate::math::*;
use crate::mesh::MeshData;
use crate::sampling::{TextureData, TriangleSampler};

/// Maps a secondary UV into the lightmap atlas: `uv * (x, y) + (z, w)`.
pub fn apply_scale_offset(uv: Vec2, scale_offset: Vec4) -> Vec2 {
    Vec2::new(uv.x * scale_offset.x + scale_offset.z, uv.y * scale_offset.y + scale_offset.w)
}

/// Multiplies vertex colors by the baked lighting under each vertex.
///
/// The lightmap is averaged over every triangle's secondary-UV footprint, and each vertex takes the
/// mean over its triangles. Touched vertices get alpha 0, vertices outside any triangle keep their
/// color. Missing colors start out white. Returns false, leaving the mesh alone, when there is no
/// secondary UV set.
pub fn multiply_lightmap(mesh: &mut MeshData, lightmap: &TextureData, scale_offset: Vec4) -> bool {
    if mesh.lightmap_coords.len() != mesh.vertex_count() {
        return false;
    }
    if mesh.colors.len() != mesh.vertex_count() {
        mesh.colors = vec![Vec4::WHITE; mesh.vertex_count()];
    }

    let sampler = TriangleSampler::new(lightmap);
    let mut sums = vec![Vec4::ZERO; mesh.vertex_count()];
    let mut counts = vec![0u32; mesh.vertex_count()];
    for tri in mesh.indices.chunks_exact(3) {
        let uv = |i: u32| apply_scale_offset(mesh.lightmap_coords[i as usize], scale_offset);
        let light = sampler.sample(uv(tri[0]), uv(tri[1]), uv(tri[2]));
        for &i in tri {
            sums[i as usize] += light;
            counts[i as usize] += 1;
        }
    }

    for ((color, sum), count) in mesh.colors.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *color = (*color * (sum / count as f32)).with_w(0.0);
        }
    }
    true
}
