use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directory of synthesized replies, served back by file name.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    /// Open the store, creating the directory if needed.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create audio directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write MP3 bytes under a fresh `<uuid>.mp3` name and return that name.
    pub async fn save_mp3(&self, bytes: &[u8]) -> Result<String> {
        let filename = format!("{}.mp3", uuid::Uuid::new_v4());
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Stored {} bytes of audio as {}", bytes.len(), filename);
        Ok(filename)
    }

    /// Read a stored file. `None` for unknown or unsafe names.
    pub async fn load(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(filename) else {
            tracing::debug!("Rejected audio file name '{}'", filename);
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Resolve a bare file name inside the store; names that could escape
    /// the directory resolve to nothing.
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
            || filename.starts_with('.')
        {
            return None;
        }
        Some(self.dir.join(filename))
    }
}
