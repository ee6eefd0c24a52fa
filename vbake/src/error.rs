/// Errors produced by the baking engine.
///
/// The first group only affects the mesh being processed: a batch reports it and moves on. Everything
/// else aborts the batch, see [`BakeError::is_recoverable`].
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    /// Object has no mesh attached
    #[error("object '{object}' has no mesh")]
    MissingMesh { object: String },

    /// Mesh has no primary UV set
    #[error("mesh '{mesh}' has no UV channel")]
    MissingUvChannel { mesh: String },

    /// Mesh data is not CPU-readable
    #[error("mesh '{mesh}' is not readable")]
    UnreadableMesh { mesh: String },

    /// Post-processing requested on a mesh without vertex colors
    #[error("mesh '{mesh}' has no vertex colors")]
    MissingVertexColors { mesh: String },

    #[error("no submeshes to combine")]
    SubmeshCombine,

    /// Buffer lengths, indices or sections are inconsistent
    #[error("mesh '{mesh}' is invalid: {reason}")]
    InvalidMesh { mesh: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// A fatal error stopped the batch; meshes finished before it stay baked
    #[error("batch aborted after {completed} mesh(es): {source}")]
    BatchAborted { completed: usize, source: Box<BakeError> },
}

impl BakeError {
    /// True for errors that only skip the current mesh.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BakeError::MissingMesh { .. }
                | BakeError::MissingUvChannel { .. }
                | BakeError::UnreadableMesh { .. }
                | BakeError::MissingVertexColors { .. }
                | BakeError::SubmeshCombine
                | BakeError::InvalidMesh { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BakeError>;
