//! What the engine needs from the application hosting the meshes: scene objects with their mesh,
//! materials and collider, a way to get readable copies of textures, and an asset store.

use crate::error::{BakeError, Result};
use crate::math::Vec4;
use crate::mesh::MeshData;
use crate::progress::ProgressSink;
use crate::sampling::TextureData;
use hashbrown::HashMap;
use std::sync::Arc;

/// Identity of a scene object, stable across a batch and its rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    pub property: String,
    pub texture: Option<Arc<TextureData>>,
}

/// A material as far as baking cares: a uniform color and named texture slots.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBinding {
    pub name: String,
    pub color: Option<Vec4>,
    pub textures: Vec<TextureSlot>,
}

impl MaterialBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), color: None, textures: Vec::new() }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_texture(mut self, property: impl Into<String>, texture: Option<Arc<TextureData>>) -> Self {
        self.textures.push(TextureSlot { property: property.into(), texture });
        self
    }

    /// Uniform color, white when the material has none.
    pub fn tint(&self) -> Vec4 {
        self.color.unwrap_or(Vec4::WHITE)
    }

    pub fn texture(&self, property: &str) -> Option<&Arc<TextureData>> {
        self.textures.iter().find(|s| s.property == property).and_then(|s| s.texture.as_ref())
    }

    pub fn texture_properties(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|s| s.property.as_str())
    }

    /// Texture under `preferred`, or else the first assigned texture in slot order.
    pub fn find_texture(&self, preferred: &str) -> Option<(&str, &Arc<TextureData>)> {
        self.textures
            .iter()
            .filter(|s| s.property == preferred)
            .find_map(assigned)
            .or_else(|| self.textures.iter().find_map(assigned))
    }
}

fn assigned(slot: &TextureSlot) -> Option<(&str, &Arc<TextureData>)> {
    slot.texture.as_ref().map(|t| (slot.property.as_str(), t))
}

/// Collision shape that may reference a render mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColliderSlot {
    pub mesh: Option<Arc<MeshData>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightmapBinding {
    pub texture: Arc<TextureData>,
    /// (scale.x, scale.y, offset.x, offset.y) into the lightmap atlas
    pub scale_offset: Vec4,
}

/// One scene object the engine may rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub object: ObjectId,
    pub name: String,
    pub mesh: Option<Arc<MeshData>>,
    pub materials: Vec<MaterialBinding>,
    pub collider: Option<ColliderSlot>,
    pub lightmap: Option<LightmapBinding>,
}

impl MeshNode {
    pub fn new(object: ObjectId, name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            object,
            name: name.into(),
            mesh: Some(Arc::new(mesh)),
            materials: Vec::new(),
            collider: None,
            lightmap: None,
        }
    }
}

/// Produces readable copies of textures the host keeps GPU-only.
pub trait TextureReader {
    fn make_readable(&self, texture: &TextureData) -> Option<TextureData>;
}

/// Host without any way to read back textures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTextureReader;

impl TextureReader for NoTextureReader {
    fn make_readable(&self, _texture: &TextureData) -> Option<TextureData> {
        None
    }
}

/// Asset store receiving baked meshes.
pub trait PersistenceSink {
    /// True if an asset called `name` already exists.
    fn exists(&self, name: &str) -> bool;

    /// Stores `mesh` as a new asset called `name` and returns its path.
    fn persist(&mut self, mesh: &MeshData, name: &str) -> Result<String>;

    /// Removes an asset created by `persist`. Missing assets are not an error.
    fn delete(&mut self, path: &str) -> Result<()>;

    /// Marks an asset as final, e.g. drops its CPU-side copy.
    fn finalize(&mut self, path: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct StoredMesh {
    pub mesh: MeshData,
    pub finalized: bool,
}

/// In-memory asset store, paths are `<folder>/<name>.mesh`.
#[derive(Debug, Default)]
pub struct MemorySink {
    folder: String,
    assets: HashMap<String, StoredMesh>,
}

impl MemorySink {
    pub fn new(folder: impl Into<String>) -> Self {
        Self { folder: folder.into(), assets: HashMap::new() }
    }

    fn path_of(&self, name: &str) -> String {
        format!("{}/{}.mesh", self.folder, name)
    }

    pub fn get(&self, path: &str) -> Option<&StoredMesh> {
        self.assets.get(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl PersistenceSink for MemorySink {
    fn exists(&self, name: &str) -> bool {
        self.assets.contains_key(&self.path_of(name))
    }

    fn persist(&mut self, mesh: &MeshData, name: &str) -> Result<String> {
        let path = self.path_of(name);
        if self.assets.contains_key(&path) {
            return Err(BakeError::Persistence(format!("asset '{path}' already exists")));
        }
        self.assets.insert(path.clone(), StoredMesh { mesh: mesh.clone(), finalized: false });
        Ok(path)
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        self.assets.remove(path);
        Ok(())
    }

    fn finalize(&mut self, path: &str) -> Result<()> {
        match self.assets.get_mut(path) {
            Some(stored) => {
                stored.finalized = true;
                stored.mesh.readable = false;
                Ok(())
            }
            None => Err(BakeError::Persistence(format!("asset '{path}' does not exist"))),
        }
    }
}

/// Everything a batch talks to besides the scene itself.
pub struct Collaborators<'a> {
    pub sink: &'a mut dyn PersistenceSink,
    pub textures: &'a dyn TextureReader,
    pub progress: &'a mut dyn ProgressSink,
}
