// JSON-backed state files

use crate::error::{PiwatchError, Result};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// One pretty-printed JSON document holding a domain's state.
///
/// Reading a missing file yields `T::default()`; fields absent from an
/// existing file are filled by the record's serde defaults.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok(T::default());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            PiwatchError::State(format!("failed to parse {}: {}", self.path.display(), e)).into()
        })
    }

    /// Load, falling back to defaults (with a warning) if the file is corrupt
    pub fn load_or_default(&self) -> T {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("{}; starting from default state", e);
            T::default()
        })
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(value).context("failed to serialize state")?;
        payload.push('\n');
        write_atomic(&self.path, &payload)
            .with_context(|| format!("failed to write state file {}", self.path.display()))
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
