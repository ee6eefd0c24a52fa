//! Records what a batch changed so it can be reverted.
//!
//! Meshes are held by `Arc`, so a record shares the original buffers with the host instead of copying
//! them. Materials are small and cloned by value.

use super::host::{ColliderSlot, MaterialBinding, MeshNode, ObjectId};
use crate::mesh::MeshData;
use std::sync::Arc;

/// State of one object before the engine touched it.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub object: ObjectId,
    pub original_mesh: Option<Arc<MeshData>>,
    pub original_materials: Vec<MaterialBinding>,
    pub original_collider: Option<ColliderSlot>,
    /// Asset created for the object, set once persistence succeeded
    pub created_path: Option<String>,
}

impl UndoRecord {
    pub fn capture(node: &MeshNode) -> Self {
        Self {
            object: node.object,
            original_mesh: node.mesh.clone(),
            original_materials: node.materials.clone(),
            original_collider: node.collider.clone(),
            created_path: None,
        }
    }

    /// Puts mesh, materials and collider back the way they were.
    pub fn restore(&self, node: &mut MeshNode) {
        node.mesh = self.original_mesh.clone();
        node.materials = self.original_materials.clone();
        node.collider = self.original_collider.clone();
    }
}

/// Undo records of the most recent operation, oldest first.
#[derive(Debug, Default)]
pub struct UndoLedger {
    records: Vec<UndoRecord>,
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when a new operation starts.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn record(&mut self, record: UndoRecord) {
        self.records.push(record);
    }

    /// Drops the most recent record, used when the object it describes was left untouched.
    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.records.pop()
    }

    pub fn last_mut(&mut self) -> Option<&mut UndoRecord> {
        self.records.last_mut()
    }

    /// Empties the ledger, handing out the records.
    pub fn take(&mut self) -> Vec<UndoRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
