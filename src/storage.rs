use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Bucket uploads go to unless the `storage_bucket` setting says otherwise.
pub const DEFAULT_BUCKET: &str = "documentos";

/// Blob storage for uploaded files, one directory per bucket.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    root: PathBuf,
    bucket: String,
}

impl ObjectStorage {
    pub fn open(storage_dir: &Path, bucket: &str) -> Result<Self> {
        validate_bucket(bucket)?;
        let root = storage_dir.join(bucket);
        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;
        Ok(Self {
            root,
            bucket: bucket.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn upload(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        tracing::debug!(bucket = %self.bucket, key, size = bytes.len(), "stored object");
        Ok(())
    }

    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound {
                kind: "object",
                name: key.to_string(),
            },
            _ => Error::Io(e),
        })
    }

    /// Remove an object, returning whether it existed. Emptied key
    /// directories are cleaned up.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || std::fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(true)
    }

    /// Location handed out alongside a stored document.
    pub fn public_url(&self, key: &str) -> Result<String> {
        let path = self.resolve(key)?;
        Ok(format!("file://{}", path.display()))
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Bucket names are a single path segment.
pub fn validate_bucket(name: &str) -> Result<()> {
    if name.contains('/') || name.contains('\\') {
        return Err(Error::Config(format!(
            "invalid bucket name '{name}': must be a single path segment"
        )));
    }
    validate_key(name)
}

/// Keys are relative, `/`-separated and may not climb out of the bucket.
fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Error::Config(format!("invalid storage key '{key}': {reason}")))
    };

    if key.is_empty() {
        return invalid("empty");
    }
    if key.split('/').any(str::is_empty) {
        return invalid("empty path segment");
    }
    for component in Path::new(key).components() {
        match component {
            Component::Normal(_) => {}
            Component::ParentDir => return invalid("contains '..'"),
            _ => return invalid("must be a relative path"),
        }
    }
    Ok(())
}
