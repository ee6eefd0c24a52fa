//! Bake parameters, loadable from TOML.
//!
//! ```toml
//! keep_old_colors = true
//!
//! [texture]
//! strength = 1.0
//! property_name = "_MainTex"
//!
//! [post]
//! average_neighbors = true
//! neighbor_radius = 0.05
//!
//! [optimize]
//! enabled = true
//! color_threshold = 0.1
//! ```

use crate::error::{BakeError, Result};
use crate::math::Vec4;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TEXTURE_PROPERTY: &str = "_MainTex";

/// Complete parameter set of a bake or post-process run. Never mutated while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    /// Multiply new colors onto colors the mesh already carries instead of replacing them
    pub keep_old_colors: bool,
    pub texture: TextureSettings,
    pub post: PostProcessConfig,
    pub optimize: OptimizeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// 0 yields white, 1 the full adjusted color
    pub strength: f32,
    pub contrast: f32,
    pub brightness: f32,
    /// Material texture property to sample, other properties are scanned if it is empty
    pub property_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    pub average_colors: bool,
    pub average_strength: f32,
    pub average_neighbors: bool,
    pub neighbor_radius: f32,
    pub neighbor_strength: f32,
    pub tint_enabled: bool,
    pub tint: [f32; 4],
    /// Multiply baked colors by the object's lightmap
    pub sample_lightmaps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub enabled: bool,
    /// Maximum HSV distance of colors merged into one vertex
    pub color_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub update_colliders: bool,
    pub folder: String,
    /// Material assigned to every converted object instead of a per-object copy
    pub shared_material: Option<String>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            keep_old_colors: true,
            texture: TextureSettings::default(),
            post: PostProcessConfig::default(),
            optimize: OptimizeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self { strength: 1.0, contrast: 1.0, brightness: 0.0, property_name: DEFAULT_TEXTURE_PROPERTY.to_string() }
    }
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            average_colors: false,
            average_strength: 0.5,
            average_neighbors: false,
            neighbor_radius: 0.1,
            neighbor_strength: 0.5,
            tint_enabled: false,
            tint: [1.0, 1.0, 1.0, 1.0],
            sample_lightmaps: false,
        }
    }
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self { enabled: false, color_threshold: 0.1 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { update_colliders: true, folder: "ConvertedMeshes".to_string(), shared_material: None }
    }
}

impl PostProcessConfig {
    pub fn tint_color(&self) -> Vec4 {
        Vec4::from_array(self.tint)
    }

    /// True if any color filter would touch the mesh.
    pub fn any_filter(&self) -> bool {
        self.average_colors || self.average_neighbors || self.tint_enabled
    }
}

impl BakeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BakeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.texture;
        check_range("texture.strength", t.strength, 0.0, 1.0)?;
        check_range("texture.contrast", t.contrast, 0.0, f32::MAX)?;
        check_range("texture.brightness", t.brightness, -1.0, 1.0)?;
        if t.property_name.trim().is_empty() {
            return Err(BakeError::InvalidConfig("texture.property_name must not be empty".into()));
        }

        let p = &self.post;
        check_range("post.average_strength", p.average_strength, 0.0, 1.0)?;
        check_range("post.neighbor_radius", p.neighbor_radius, 0.0, f32::MAX)?;
        check_range("post.neighbor_strength", p.neighbor_strength, 0.0, 1.0)?;
        for c in p.tint {
            check_range("post.tint", c, 0.0, f32::MAX)?;
        }

        check_range("optimize.color_threshold", self.optimize.color_threshold, 0.0, f32::MAX)?;

        if self.output.folder.trim().is_empty() {
            return Err(BakeError::InvalidConfig("output.folder must not be empty".into()));
        }
        Ok(())
    }
}

fn check_range(key: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(BakeError::InvalidConfig(format!("{key} = {value} is out of range [{min}, {max}]")))
    }
}
