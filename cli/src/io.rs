use anyhow::{Context, Result, anyhow};
use hashbrown::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use vbake::math::*;
use vbake::mesh::*;
use vbake::sampling::*;
use vbake::session::*;
use wavefront_obj::obj;

pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<TextureData> {
    let path = path.as_ref();
    let image = image::open(path).with_context(|| format!("failed to read texture {}", path.display()))?;
    let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(TextureData::from_image(name, &image.to_rgba8()))
}

/// Loads every object of an OBJ file as a scene node. Each geometry group becomes one section with
/// its own material, and all materials get `texture` under `property`.
pub fn load_scene<P: AsRef<Path>>(path: P, texture: Option<Arc<TextureData>>, property: &str) -> Result<Vec<MeshNode>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let set = obj::parse(text).map_err(|e| anyhow!("{}:{}: {}", path.display(), e.line_number, e.message))?;

    let mut nodes = Vec::with_capacity(set.objects.len());
    for (i, object) in set.objects.iter().enumerate() {
        let mesh = mesh_from_object(object);
        mesh.validate().with_context(|| format!("object '{}' is malformed", object.name))?;

        let mut node = MeshNode::new(ObjectId(i as u64), object.name.clone(), mesh);
        node.materials = geometries(object)
            .enumerate()
            .map(|(g, geometry)| {
                let name = geometry.material_name.clone().unwrap_or_else(|| format!("{}_{}", object.name, g));
                MaterialBinding::new(name).with_texture(property, texture.clone())
            })
            .collect();
        nodes.push(node);
    }
    Ok(nodes)
}

// Geometry groups that contain no faces produce neither a section nor a material
fn geometries(object: &obj::Object) -> impl Iterator<Item = &obj::Geometry> {
    object.geometry.iter().filter(|g| !g.shapes.is_empty())
}

fn mesh_from_object(object: &obj::Object) -> MeshData {
    // OBJ indexes positions and UVs separately, a vertex is a unique (position, uv) pair
    let mut remap: HashMap<(usize, Option<usize>), u32> = HashMap::new();
    let mut positions = Vec::new();
    let mut tex_coords = Vec::new();
    let mut indices = Vec::new();
    let mut sections = Vec::new();
    let has_uvs = !object.tex_vertices.is_empty();

    for (g, geometry) in geometries(object).enumerate() {
        let start = indices.len();
        for shape in &geometry.shapes {
            let obj::Primitive::Triangle(v0, v1, v2) = &shape.primitive else {
                continue;
            };
            for &(v, t, _) in [v0, v1, v2] {
                let index = *remap.entry((v, t)).or_insert_with(|| {
                    let p = &object.vertices[v];
                    positions.push(Vec3::new(p.x as f32, p.y as f32, p.z as f32));
                    if has_uvs {
                        let uv = t.map(|t| &object.tex_vertices[t]);
                        tex_coords.push(uv.map_or(Vec2::new(0.0, 0.0), |uv| Vec2::new(uv.u as f32, uv.v as f32)));
                    }
                    (positions.len() - 1) as u32
                });
                indices.push(index);
            }
        }
        sections.push(MeshDataSection {
            start_index: start,
            num_triangles: (indices.len() - start) / 3,
            material_index: g,
        });
    }

    let mut mesh = MeshData::new(object.name.clone(), positions, tex_coords, indices);
    mesh.sections = sections;
    mesh.recalculate_derived();
    mesh
}

/// Writes one mesh as an OBJ object, vertex colors as the `v x y z r g b` extension.
pub fn write_obj<W: Write>(mesh: &MeshData, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "o {}", mesh.name)?;
    for (i, p) in mesh.positions.iter().enumerate() {
        match mesh.colors.get(i) {
            Some(&color) => {
                let c = RGBA::from_vec4(color);
                writeln!(
                    out,
                    "v {} {} {} {:.4} {:.4} {:.4}",
                    p.x,
                    p.y,
                    p.z,
                    c.r as f32 / 255.0,
                    c.g as f32 / 255.0,
                    c.b as f32 / 255.0
                )?;
            }
            None => writeln!(out, "v {} {} {}", p.x, p.y, p.z)?,
        }
    }
    for uv in &mesh.tex_coords {
        writeln!(out, "vt {} {}", uv.x, uv.y)?;
    }
    for n in &mesh.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    let corner = |i: u32| -> String {
        let i = i + 1;
        match (mesh.has_tex_coords(), mesh.normals.is_empty()) {
            (true, false) => format!("{i}/{i}/{i}"),
            (true, true) => format!("{i}/{i}"),
            (false, false) => format!("{i}//{i}"),
            (false, true) => format!("{i}"),
        }
    };
    for tri in mesh.indices.chunks_exact(3) {
        writeln!(out, "f {} {} {}", corner(tri[0]), corner(tri[1]), corner(tri[2]))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "o Quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl Left
f 1/1 2/2 3/3
usemtl Right
f 1/1 3/3 4/4
";

    #[test]
    fn test_load_scene_sections() {
        let dir = std::env::temp_dir().join("vbake_cli_load_scene");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("quad.obj");
        std::fs::write(&path, QUAD).unwrap();

        let nodes = load_scene(&path, None, "_MainTex").unwrap();
        assert_eq!(nodes.len(), 1);
        let mesh = nodes[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.sections.len(), 2);
        assert_eq!(mesh.sections[1].start_index, 3);
        let names: Vec<&str> = nodes[0].materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Left", "Right"]);
    }

    #[test]
    fn test_write_obj_colors() {
        let mut mesh = MeshData::new(
            "Tri",
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![],
            vec![0, 1, 2],
        );
        mesh.colors = vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 3];
        let mut out = Vec::new();
        write_obj(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("o Tri\n"));
        assert!(text.contains("v 1 0 0 1.0000 0.0000 0.0000\n"));
        assert!(text.ends_with("f 1 2 3\n"));
    }
}
