use super::mesh_data::*;
use crate::error::{BakeError, Result};
use crate::math::*;
use hashbrown::HashMap;

/// Copies one section into an independent single-section mesh.
///
/// Only vertices referenced by the section are kept, renumbered densely in order of first use.
/// Positions, UVs and lightmap UVs are carried over. Colors are not: the section is about to be
/// re-baked. A missing UV channel yields zero UVs.
pub fn extract_section(mesh: &MeshData, section: usize) -> MeshData {
    let source = mesh.section_indices(section);
    let mut remap: HashMap<u32, u32> = HashMap::with_capacity(source.len());
    let mut positions = Vec::new();
    let mut tex_coords = Vec::new();
    let mut lightmap_coords = Vec::new();
    let mut indices = Vec::with_capacity(source.len());

    for &old in source {
        let new = *remap.entry(old).or_insert_with(|| {
            let i = old as usize;
            positions.push(mesh.positions[i]);
            tex_coords.push(mesh.tex_coords.get(i).copied().unwrap_or_default());
            if mesh.has_lightmap_coords() {
                lightmap_coords.push(mesh.lightmap_coords[i]);
            }
            (positions.len() - 1) as u32
        });
        indices.push(new);
    }

    let mut part = MeshData::new(format!("{}_SubMesh{}", mesh.name, section), positions, tex_coords, indices);
    part.lightmap_coords = lightmap_coords;
    part.readable = mesh.readable;
    part
}

/// Concatenates meshes into one single-section mesh on material slot 0.
///
/// Index ranges are offset by the preceding vertex counts. Channels present in only some parts are
/// padded (white colors, zero UVs) so the result stays consistent.
pub fn combine(parts: &[MeshData]) -> Result<MeshData> {
    let Some(first) = parts.first() else {
        return Err(BakeError::SubmeshCombine);
    };

    let any_colors = parts.iter().any(|p| p.has_colors());
    let any_uvs = parts.iter().any(|p| p.has_tex_coords());
    let any_lightmap = parts.iter().any(|p| p.has_lightmap_coords());

    let mut combined = MeshData { name: first.name.clone(), readable: first.readable, ..Default::default() };
    for part in parts {
        let offset = combined.positions.len() as u32;
        let n = part.vertex_count();
        combined.positions.extend_from_slice(&part.positions);
        if any_uvs {
            extend_or_pad(&mut combined.tex_coords, &part.tex_coords, n, Vec2::default());
        }
        if any_lightmap {
            extend_or_pad(&mut combined.lightmap_coords, &part.lightmap_coords, n, Vec2::default());
        }
        if any_colors {
            extend_or_pad(&mut combined.colors, &part.colors, n, Vec4::WHITE);
        }
        combined.indices.extend(part.indices.iter().map(|i| i + offset));
    }

    combined.sections =
        vec![MeshDataSection { start_index: 0, num_triangles: combined.triangle_count(), material_index: 0 }];
    combined.recalculate_bounds();
    Ok(combined)
}

fn extend_or_pad<T: Copy>(dst: &mut Vec<T>, src: &[T], count: usize, fill: T) {
    if src.len() == count {
        dst.extend_from_slice(src);
    } else {
        dst.extend(std::iter::repeat_n(fill, count));
    }
}
