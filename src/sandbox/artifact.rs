//! Scoped temporary script file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::{Error, Result};

/// A generated script that lives for exactly one execution.
///
/// Call [`ScriptArtifact::release`] once the child has terminated. If the
/// owner unwinds first, `Drop` removes the file instead.
pub struct ScriptArtifact {
    /// Backing file, `None` once released.
    file: Option<NamedTempFile>,
    /// Path of the script on disk.
    path: PathBuf,
}

impl ScriptArtifact {
    /// Writes `program` to a uniquely named `sandbox-*.py` file in `dir`.
    pub fn create(dir: &Path, program: &str) -> Result<Self> {
        let creation_error = |source| Error::ArtifactCreation {
            dir: dir.to_path_buf(),
            source,
        };

        let mut file = Builder::new()
            .prefix("sandbox-")
            .suffix(".py")
            .tempfile_in(dir)
            .map_err(creation_error)?;

        file.write_all(program.as_bytes()).map_err(creation_error)?;
        file.flush().map_err(creation_error)?;

        let path = file.path().to_path_buf();
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Returns the path of the script.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the script. Failures are logged and swallowed.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };

        if let Err(e) = file.close() {
            tracing::warn!(
                error = %e,
                artifact = ?self.path,
                "failed to remove script artifact, may need manual cleanup"
            );
        }
    }
}

impl Drop for ScriptArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}
