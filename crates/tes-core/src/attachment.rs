use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

/// A file selected for upload alongside a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment from in-memory bytes, guessing the MIME type
    /// from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self { file_name, mime, bytes }
    }

    /// Read a file from disk. A leading `~/` expands to the home directory.
    pub async fn from_path(path: &str) -> Result<Self> {
        let path = expand_home(path.trim());

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?
            .to_string();

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;

        tracing::debug!(file = %path.display(), size = bytes.len(), "attachment loaded");
        Ok(Self::new(file_name, bytes))
    }

    /// Size of the file in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(path).to_path_buf()
}
