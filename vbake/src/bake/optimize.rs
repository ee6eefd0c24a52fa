use crate::error::{BakeError, Result};
use crate::math::*;
use crate::mesh::MeshData;
use crate::progress::ProgressSink;
use hashbrown::HashMap;

/// Grid size used to decide that two vertices share a position.
pub const POSITION_PRECISION: f32 = 0.0001;

/// Upper bound for the color threshold (diagonal of the unit HSV cube).
pub const MAX_COLOR_THRESHOLD: f32 = 1.732_050_8;

/// Merges vertices that share a position and have similar colors.
///
/// Vertices are grouped by quantized position in order of first occurrence. Inside a group each vertex
/// joins the first cluster whose first member is within `color_threshold` in HSV space, or starts a
/// new cluster. A cluster becomes one vertex with the position and color of its first member and the
/// mean of the members' UVs. Triangles are remapped, never dropped. Progress is reported once per
/// position group.
pub fn optimize_vertices(mesh: &MeshData, color_threshold: f32, progress: &mut dyn ProgressSink) -> Result<MeshData> {
    if !mesh.has_colors() {
        return Err(BakeError::MissingVertexColors { mesh: mesh.name.clone() });
    }
    mesh.validate()?;
    let threshold = color_threshold.clamp(0.0, MAX_COLOR_THRESHOLD);

    let mut group_of: HashMap<QuantizedPosition, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, &p) in mesh.positions.iter().enumerate() {
        let key = QuantizedPosition::new(p, POSITION_PRECISION);
        let g = *group_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }

    let mut out = MeshData { name: mesh.name.clone(), readable: mesh.readable, ..Default::default() };
    let mut remap = vec![0u32; mesh.vertex_count()];
    let label = format!("Optimizing {}", mesh.name);
    for (g, group) in groups.iter().enumerate() {
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for &i in group {
            let color = mesh.colors[i];
            match clusters.iter_mut().find(|c| is_color_similar(color, mesh.colors[c[0]], threshold)) {
                Some(cluster) => cluster.push(i),
                None => clusters.push(vec![i]),
            }
        }

        for cluster in &clusters {
            let first = cluster[0];
            let new_index = out.positions.len() as u32;
            out.positions.push(mesh.positions[first]);
            out.colors.push(mesh.colors[first]);
            if mesh.has_tex_coords() {
                out.tex_coords.push(mean_uv(&mesh.tex_coords, cluster));
            }
            if mesh.has_lightmap_coords() {
                out.lightmap_coords.push(mean_uv(&mesh.lightmap_coords, cluster));
            }
            for &i in cluster {
                remap[i] = new_index;
            }
        }
        progress.report(&label, (g + 1) as f32 / groups.len() as f32);
    }

    out.indices = mesh.indices.iter().map(|&i| remap[i as usize]).collect();
    out.sections = mesh.sections.clone();
    out.recalculate_derived();

    log::debug!("optimized mesh '{}': {} -> {} vertices", mesh.name, mesh.vertex_count(), out.vertex_count());
    Ok(out)
}

fn mean_uv(uvs: &[Vec2], cluster: &[usize]) -> Vec2 {
    let mut sum = Vec2::default();
    for &i in cluster {
        sum += uvs[i];
    }
    sum / cluster.len() as f32
}
