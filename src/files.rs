//! File checks run after validation and before the provider is contacted.

use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Basic metadata about an audio file, used for logging.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub extension: String,
}

impl FileInfo {
    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn size_human(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Confirm `path` exists, is a regular file and can be read.
pub async fn inspect_audio_file(path: impl AsRef<Path>) -> AppResult<FileInfo> {
    let path = path.as_ref();

    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::Io(format!("Audio file not found: {}", path.display())));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Err(AppError::Io(format!("Path is not a file: {}", path.display())));
    }

    // Reading one byte proves the file is readable
    let mut first_byte = [0u8; 1];
    let readable = match tokio::fs::File::open(path).await {
        Ok(mut file) => file.read(&mut first_byte).await.map(|_| ()),
        Err(e) => Err(e),
    };
    readable.map_err(|e| {
        AppError::Io(format!("File is not readable: {}. Error: {}", path.display(), e))
    })?;

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(FileInfo {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: absolute.display().to_string(),
        size_bytes: metadata.len(),
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    })
}
