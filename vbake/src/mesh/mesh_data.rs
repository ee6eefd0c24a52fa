use crate::error::{BakeError, Result};
use crate::math::*;

/// Contiguous range of triangles drawn with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshDataSection {
    pub start_index: usize,
    pub num_triangles: usize,
    pub material_index: usize,
}

impl MeshDataSection {
    pub fn end_index(&self) -> usize {
        self.start_index + self.num_triangles * 3
    }
}

/// Indexed triangle mesh. Per-vertex channels are either empty (absent) or have one entry per
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>, // w is the bitangent sign
    pub tex_coords: Vec<Vec2>,
    pub lightmap_coords: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub indices: Vec<u32>,
    pub sections: Vec<MeshDataSection>,
    pub aabb: AABB,
    /// CPU access to the buffers is allowed
    pub readable: bool,
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            name: String::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            tangents: Vec::new(),
            tex_coords: Vec::new(),
            lightmap_coords: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
            sections: Vec::new(),
            aabb: AABB::default(),
            readable: true,
        }
    }
}

impl MeshData {
    /// Single-section mesh over all of `indices`.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, tex_coords: Vec<Vec2>, indices: Vec<u32>) -> Self {
        let sections = vec![MeshDataSection { start_index: 0, num_triangles: indices.len() / 3, material_index: 0 }];
        let aabb = AABB::from_points(&positions);
        Self { name: name.into(), positions, tex_coords, indices, sections, aabb, ..Default::default() }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn has_lightmap_coords(&self) -> bool {
        !self.lightmap_coords.is_empty()
    }

    /// True if any UV lies outside the unit square, i.e. the texture repeats across the mesh.
    pub fn has_tiling_uvs(&self) -> bool {
        self.tex_coords.iter().any(|uv| uv.is_outside_unit_square())
    }

    /// Index triples of one section.
    pub fn section_indices(&self, section: usize) -> &[u32] {
        let s = &self.sections[section];
        &self.indices[s.start_index..s.end_index()]
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        let channel = |name: &str, len: usize| -> Result<()> {
            if len != 0 && len != n {
                return Err(self.invalid(format!("{name} has {len} entries for {n} vertices")));
            }
            Ok(())
        };
        channel("tex_coords", self.tex_coords.len())?;
        channel("lightmap_coords", self.lightmap_coords.len())?;
        channel("colors", self.colors.len())?;
        channel("normals", self.normals.len())?;
        channel("tangents", self.tangents.len())?;

        if self.indices.len() % 3 != 0 {
            return Err(self.invalid(format!("index count {} is not a multiple of 3", self.indices.len())));
        }
        if let Some(&i) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(self.invalid(format!("index {i} out of range for {n} vertices")));
        }

        let mut expected_start = 0;
        for (i, s) in self.sections.iter().enumerate() {
            if s.start_index != expected_start {
                return Err(self.invalid(format!("section {i} starts at {} instead of {expected_start}", s.start_index)));
            }
            expected_start = s.end_index();
        }
        if expected_start != self.indices.len() {
            return Err(self.invalid(format!("sections cover {expected_start} of {} indices", self.indices.len())));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> BakeError {
        BakeError::InvalidMesh { mesh: self.name.clone(), reason }
    }

    /// Area-weighted vertex normals. Vertices touched only by degenerate triangles get a zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::default(); self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let p0 = self.positions[i0];
            let n = cross(self.positions[i1] - p0, self.positions[i2] - p0);
            normals[i0] += n;
            normals[i1] += n;
            normals[i2] += n;
        }
        for n in &mut normals {
            *n = n.normalized_or_zero();
        }
        self.normals = normals;
    }

    /// Per-vertex tangent frames from positions, UVs and normals. Cleared when there are no UVs.
    pub fn recalculate_tangents(&mut self) {
        if self.tex_coords.is_empty() {
            self.tangents.clear();
            return;
        }
        if self.normals.len() != self.positions.len() {
            self.recalculate_normals();
        }

        let n = self.positions.len();
        let mut tan_u = vec![Vec3::default(); n];
        let mut tan_v = vec![Vec3::default(); n];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let e1 = self.positions[i1] - self.positions[i0];
            let e2 = self.positions[i2] - self.positions[i0];
            let d1 = self.tex_coords[i1] - self.tex_coords[i0];
            let d2 = self.tex_coords[i2] - self.tex_coords[i0];
            let det = d1.x * d2.y - d2.x * d1.y;
            if det == 0.0 {
                continue;
            }
            let r = 1.0 / det;
            let sdir = (e1 * d2.y - e2 * d1.y) * r;
            let tdir = (e2 * d1.x - e1 * d2.x) * r;
            for i in [i0, i1, i2] {
                tan_u[i] += sdir;
                tan_v[i] += tdir;
            }
        }

        self.tangents = (0..n)
            .map(|i| {
                let normal = self.normals[i];
                let t = (tan_u[i] - normal * dot(normal, tan_u[i])).normalized_or_zero();
                let w = if dot(cross(normal, t), tan_v[i]) < 0.0 { -1.0 } else { 1.0 };
                Vec4::new(t.x, t.y, t.z, w)
            })
            .collect();
    }

    pub fn recalculate_bounds(&mut self) {
        self.aabb = AABB::from_points(&self.positions);
    }

    /// Normals, tangents and bounds, in that order.
    pub fn recalculate_derived(&mut self) {
        self.recalculate_normals();
        self.recalculate_tangents();
        self.recalculate_bounds();
    }
}
