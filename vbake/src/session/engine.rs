//! Batch orchestration: split, bake, combine, filter, optimize, persist, swap.
//!
//! The engine never edits a host mesh in place. It bakes a working copy and only replaces the node's
//! `Arc` once the result is persisted, so a failed mesh leaves its node untouched.

use super::host::*;
use super::ledger::{UndoLedger, UndoRecord};
use super::naming::{strip_modified_suffix, AssetNamer};
use crate::bake::{apply_filter_chain, multiply_lightmap, optimize_vertices, TriangleBaker};
use crate::config::BakeConfig;
use crate::error::{BakeError, Result};
use crate::math::Vec4;
use crate::mesh::{combine, extract_section, MeshData};
use crate::progress::ProgressSink;
use crate::sampling::TextureData;
use hashbrown::HashSet;
use std::sync::Arc;

/// Name of the material assigned when an object had none to copy from.
pub const VERTEX_COLOR_MATERIAL: &str = "VertexColorMaterial";

/// Vertex totals over all meshes of the last operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BakeStats {
    pub vertices_before: usize,
    pub vertices_after_processing: usize,
    pub vertices_after_optimization: usize,
}

#[derive(Debug)]
pub struct SkippedMesh {
    pub object: ObjectId,
    pub name: String,
    pub error: BakeError,
}

/// Outcome of a batch that ran to the end or was cancelled.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<ObjectId>,
    pub skipped: Vec<SkippedMesh>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub restored: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Bake,
    PostProcess,
}

/// Long-lived state of a baking session: the undo ledger of the last operation, every asset created
/// since the last finalize, and statistics.
pub struct BakeSession {
    config: BakeConfig,
    ledger: UndoLedger,
    created_paths: HashSet<String>,
    namer: AssetNamer,
    stats: BakeStats,
}

impl BakeSession {
    pub fn new(config: BakeConfig) -> Result<Self> {
        Self::with_namer(config, AssetNamer::new())
    }

    pub fn with_namer(config: BakeConfig, namer: AssetNamer) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ledger: UndoLedger::new(), created_paths: HashSet::new(), namer, stats: BakeStats::default() })
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    pub fn stats(&self) -> BakeStats {
        self.stats
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    /// Assets created since the last [`BakeSession::finalize_created`], sorted.
    pub fn created_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.created_paths.iter().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Bakes the texture of every node's materials into vertex colors.
    ///
    /// Meshes that cannot be baked are reported and skipped. Persistence failures abort the batch,
    /// meshes finished before stay baked.
    pub fn process_batch(&mut self, nodes: &mut [MeshNode], io: &mut Collaborators<'_>) -> Result<BatchReport> {
        self.run_batch(nodes, io, Operation::Bake)
    }

    /// Runs the lightmap multiply, color filters and optimizer on meshes that already have vertex
    /// colors. Materials are left alone.
    pub fn post_process_batch(&mut self, nodes: &mut [MeshNode], io: &mut Collaborators<'_>) -> Result<BatchReport> {
        self.run_batch(nodes, io, Operation::PostProcess)
    }

    /// Reverts every object the last operation changed and deletes the assets it created.
    ///
    /// Every deletion is attempted. Records whose asset could not be deleted stay in the ledger so a
    /// later rollback retries them, and the first failure is returned.
    pub fn rollback(&mut self, nodes: &mut [MeshNode], sink: &mut dyn PersistenceSink) -> Result<RollbackReport> {
        let records = self.ledger.take();
        let mut report = RollbackReport::default();

        for record in &records {
            if let Some(node) = nodes.iter_mut().find(|n| n.object == record.object) {
                record.restore(node);
                report.restored += 1;
            }
        }

        let mut first_error = None;
        for record in records {
            let Some(path) = record.created_path.as_deref() else {
                continue;
            };
            match sink.delete(path) {
                Ok(()) => {
                    self.created_paths.remove(path);
                    report.deleted += 1;
                }
                Err(error) => {
                    log::warn!("failed to delete '{}': {}", path, error);
                    first_error.get_or_insert(error);
                    self.ledger.record(record);
                }
            }
        }

        self.stats = BakeStats::default();
        log::info!("rolled back {} object(s), deleted {} asset(s)", report.restored, report.deleted);
        match first_error {
            Some(error) => Err(error),
            None => Ok(report),
        }
    }

    /// Finalizes every asset created since the last call and forgets them.
    pub fn finalize_created(&mut self, sink: &mut dyn PersistenceSink) -> Result<usize> {
        let paths: Vec<String> = self.created_paths().into_iter().map(str::to_owned).collect();
        for path in &paths {
            sink.finalize(path)?;
            self.created_paths.remove(path.as_str());
        }
        log::info!("finalized {} asset(s)", paths.len());
        Ok(paths.len())
    }

    fn run_batch(&mut self, nodes: &mut [MeshNode], io: &mut Collaborators<'_>, op: Operation) -> Result<BatchReport> {
        self.ledger.clear();
        self.stats = BakeStats::default();

        let mut report = BatchReport::default();
        for node in nodes.iter_mut() {
            if io.progress.is_cancelled() {
                log::info!("batch cancelled after {} mesh(es)", report.completed.len());
                report.cancelled = true;
                break;
            }

            match self.process_node(node, io, op) {
                Ok(()) => report.completed.push(node.object),
                Err(error) if error.is_recoverable() => {
                    log::warn!("skipping '{}': {}", node.name, error);
                    report.skipped.push(SkippedMesh { object: node.object, name: node.name.clone(), error });
                }
                Err(error) => {
                    log::error!("aborting batch at '{}': {}", node.name, error);
                    return Err(BakeError::BatchAborted { completed: report.completed.len(), source: Box::new(error) });
                }
            }
        }

        log::info!(
            "{} mesh(es) done, {} skipped; vertices {} -> {} -> {}",
            report.completed.len(),
            report.skipped.len(),
            self.stats.vertices_before,
            self.stats.vertices_after_processing,
            self.stats.vertices_after_optimization
        );
        Ok(report)
    }

    fn process_node(&mut self, node: &mut MeshNode, io: &mut Collaborators<'_>, op: Operation) -> Result<()> {
        let Some(mesh) = node.mesh.clone() else {
            return Err(BakeError::MissingMesh { object: node.name.clone() });
        };
        if !mesh.readable {
            return Err(BakeError::UnreadableMesh { mesh: mesh.name.clone() });
        }
        if op == Operation::Bake && !mesh.has_tex_coords() {
            return Err(BakeError::MissingUvChannel { mesh: mesh.name.clone() });
        }
        mesh.validate()?;

        self.ledger.record(UndoRecord::capture(node));
        let result = match op {
            Operation::Bake => self.bake_node(node, &mesh, io),
            Operation::PostProcess => self.post_process_node(node, &mesh, io),
        };
        if result.is_err() {
            self.ledger.pop();
        }
        result
    }

    fn bake_node(&mut self, node: &mut MeshNode, mesh: &MeshData, io: &mut Collaborators<'_>) -> Result<()> {
        log::debug!("baking '{}' ({} vertices, {} sections)", node.name, mesh.vertex_count(), mesh.sections.len());
        let mut working = mesh.clone();
        working.name = format!("{}_Modified", strip_modified_suffix(&mesh.name));

        let baked = if working.sections.len() > 1 {
            let mut parts = Vec::with_capacity(working.sections.len());
            for (i, section) in working.sections.iter().enumerate() {
                let part = extract_section(&working, i);
                let material = node.materials.get(section.material_index);
                match self.bake_part(&part, material, io) {
                    Ok(baked) => parts.push(baked),
                    Err(error) if error.is_recoverable() => log::warn!("skipping section {i} of '{}': {}", node.name, error),
                    Err(error) => return Err(error),
                }
            }
            let mut combined = combine(&parts)?;
            combined.name = working.name.clone();
            combined
        } else {
            self.bake_part(&working, node.materials.first(), io)?
        };

        self.stats.vertices_before += mesh.vertex_count();
        self.stats.vertices_after_processing += baked.vertex_count();
        let finished = self.finish(baked, &mut *io.progress)?;
        self.stats.vertices_after_optimization += finished.vertex_count();

        self.persist_and_assign(node, finished, io)?;
        node.materials = vec![self.output_material(&node.materials)];
        Ok(())
    }

    fn bake_part(&self, part: &MeshData, material: Option<&MaterialBinding>, io: &mut Collaborators<'_>) -> Result<MeshData> {
        let tint = material.map(MaterialBinding::tint).unwrap_or(Vec4::WHITE);
        let texture = material.and_then(|m| self.resolve_texture(m, io.textures));
        let baker = TriangleBaker::from_config(&self.config, texture.as_deref(), tint);
        baker.bake(part, &mut *io.progress)
    }

    fn post_process_node(&mut self, node: &mut MeshNode, mesh: &MeshData, io: &mut Collaborators<'_>) -> Result<()> {
        log::debug!("post-processing '{}' ({} vertices)", node.name, mesh.vertex_count());
        let mut working = mesh.clone();
        working.name = format!("{}_Modified", strip_modified_suffix(&mesh.name));

        if self.config.post.sample_lightmaps {
            self.apply_lightmap(node, &mut working, io.textures);
        }
        if !working.has_colors() {
            return Err(BakeError::MissingVertexColors { mesh: mesh.name.clone() });
        }

        self.stats.vertices_before += working.vertex_count();
        self.stats.vertices_after_processing += working.vertex_count();
        let finished = self.finish(working, &mut *io.progress)?;
        self.stats.vertices_after_optimization += finished.vertex_count();

        self.persist_and_assign(node, finished, io)
    }

    fn apply_lightmap(&self, node: &MeshNode, mesh: &mut MeshData, reader: &dyn TextureReader) {
        let Some(binding) = &node.lightmap else {
            log::warn!("'{}' has no lightmap, skipping lightmap sampling", node.name);
            return;
        };
        let Some(lightmap) = readable(&binding.texture, reader) else {
            return;
        };
        if !multiply_lightmap(mesh, &lightmap, binding.scale_offset) {
            log::warn!("'{}' has no secondary UVs, skipping lightmap sampling", node.name);
        }
    }

    /// Filters, then either the optimizer or a plain recompute of normals, tangents and bounds.
    fn finish(&self, mut mesh: MeshData, progress: &mut dyn ProgressSink) -> Result<MeshData> {
        if self.config.post.any_filter() {
            apply_filter_chain(&mesh.positions, &mut mesh.colors, &self.config.post, progress);
        }
        if self.config.optimize.enabled {
            optimize_vertices(&mesh, self.config.optimize.color_threshold, progress)
        } else {
            mesh.recalculate_derived();
            Ok(mesh)
        }
    }

    fn persist_and_assign(&mut self, node: &mut MeshNode, mut mesh: MeshData, io: &mut Collaborators<'_>) -> Result<()> {
        let sink = &mut *io.sink;
        let name = self.namer.unique_name(&node.name, |n| sink.exists(n));
        mesh.name = name.clone();
        let path = sink.persist(&mesh, &name)?;
        log::debug!("saved '{}' as '{}'", node.name, path);

        self.created_paths.insert(path.clone());
        if let Some(record) = self.ledger.last_mut() {
            record.created_path = Some(path);
        }

        let mesh = Arc::new(mesh);
        if self.config.output.update_colliders {
            if let Some(collider) = node.collider.as_mut() {
                collider.mesh = Some(Arc::clone(&mesh));
            }
        }
        node.mesh = Some(mesh);
        Ok(())
    }

    /// Texture under the configured property, else the first one the material has, made readable.
    fn resolve_texture(&self, material: &MaterialBinding, reader: &dyn TextureReader) -> Option<Arc<TextureData>> {
        let preferred = &self.config.texture.property_name;
        let Some((property, texture)) = material.find_texture(preferred) else {
            let properties: Vec<&str> = material.texture_properties().collect();
            log::debug!("material '{}' has no texture in [{}], using its color", material.name, properties.join(", "));
            return None;
        };
        if property != preferred {
            log::debug!("material '{}' has no '{}', using '{}'", material.name, preferred, property);
        }
        readable(texture, reader)
    }

    fn output_material(&self, originals: &[MaterialBinding]) -> MaterialBinding {
        if let Some(shared) = &self.config.output.shared_material {
            return MaterialBinding::new(shared.as_str());
        }
        match originals.first() {
            Some(first) => {
                let mut copy = first.clone();
                copy.name = format!("{}_VertexColors", first.name);
                copy
            }
            None => MaterialBinding::new(VERTEX_COLOR_MATERIAL),
        }
    }
}

fn readable(texture: &Arc<TextureData>, reader: &dyn TextureReader) -> Option<Arc<TextureData>> {
    if texture.readable {
        return Some(Arc::clone(texture));
    }
    log::warn!("texture '{}' is not readable, requesting a readable copy", texture.name);
    match reader.make_readable(texture) {
        Some(copy) => Some(Arc::new(copy)),
        None => {
            log::warn!("no readable copy of texture '{}', using the material color", texture.name);
            None
        }
    }
}
