use crate::io::write_obj;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use vbake::mesh::MeshData;
use vbake::session::PersistenceSink;
use vbake::{BakeError, ProgressSink};

/// Stores every baked mesh as `<folder>/<name>.obj`. Finalized assets become read-only files.
pub struct DirectorySink {
    folder: PathBuf,
}

impl DirectorySink {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self { folder: folder.into() }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.folder.join(format!("{name}.obj"))
    }
}

impl PersistenceSink for DirectorySink {
    fn exists(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }

    fn persist(&mut self, mesh: &MeshData, name: &str) -> vbake::Result<String> {
        let path = self.path_of(name);
        if path.exists() {
            return Err(BakeError::Persistence(format!("{} already exists", path.display())));
        }
        let mut out = BufWriter::new(fs::File::create(&path)?);
        write_obj(mesh, &mut out)?;
        out.flush()?;
        tracing::debug!("wrote {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    fn delete(&mut self, path: &str) -> vbake::Result<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn finalize(&mut self, path: &str) -> vbake::Result<()> {
        let metadata = fs::metadata(path).map_err(|_| BakeError::Persistence(format!("{path} does not exist")))?;
        let mut permissions = metadata.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(path, permissions)?;
        Ok(())
    }
}

/// Logs progress in 10% steps.
#[derive(Default)]
pub struct LogProgress {
    label: String,
    step: i32,
}

impl ProgressSink for LogProgress {
    fn report(&mut self, label: &str, fraction: f32) {
        let step = (fraction * 10.0).floor() as i32;
        if label != self.label {
            self.label = label.to_string();
            self.step = -1;
        }
        if step > self.step {
            self.step = step;
            tracing::debug!("{label}: {}%", step * 10);
        }
    }
}
