// ============================================================
// EVENT STORAGE
// ============================================================
// Fixed-name file layout under one data directory: the raw
// upload is kept beside the JSON cache, and cache replacement is
// atomic so readers never observe a partial file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::application::use_cases::upload::FileType;
use crate::domain::error::{AppError, Result};

const XML_FILE: &str = "events.xml";
const CSV_FILE: &str = "calendar.csv";
const CACHE_FILE: &str = "events.json";

fn io_err(msg: impl Into<String>) -> AppError {
    AppError::IoError(msg.into())
}

#[derive(Debug)]
pub struct EventStorage {
    dir: PathBuf,
    // Serializes cache replacement within this process.
    write_lock: Mutex<()>,
}

impl EventStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination of a raw upload. Each type has one fixed name, so a
    /// new upload replaces the previous one of the same type.
    pub fn upload_target(&self, file_type: FileType) -> PathBuf {
        match file_type {
            FileType::Xml => self.dir.join(XML_FILE),
            FileType::Csv => self.dir.join(CSV_FILE),
        }
    }

    pub fn store_upload(&self, file_type: FileType, bytes: &[u8]) -> Result<()> {
        atomic_write_bytes(&self.upload_target(file_type), bytes)
    }

    /// Replace the event cache with new content.
    pub fn replace_cache(&self, bytes: &[u8]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Internal("cache write lock poisoned".to_string()))?;
        atomic_write_bytes(&self.dir.join(CACHE_FILE), bytes)
    }

    /// Current cache content, or `None` when nothing was published yet.
    pub fn read_cache(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(self.dir.join(CACHE_FILE)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(format!("Failed to read event cache: {e}"))),
        }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| io_err(format!("Failed to create dir {}: {e}", path.display())))?;
    Ok(())
}

/// Write via a temp file in the same directory, then rename over the
/// destination. Rename is atomic on the platforms we target.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            io_err(format!(
                "Failed to create temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.write_all(bytes).map_err(|e| {
            io_err(format!(
                "Failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.sync_all().ok();
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        io_err(format!(
            "Failed to rename temp file {} to {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cache_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = EventStorage::new(dir.path());

        assert_eq!(storage.read_cache().unwrap(), None);

        storage.replace_cache(b"[1,2]").unwrap();
        assert_eq!(storage.read_cache().unwrap(), Some(b"[1,2]".to_vec()));

        storage.replace_cache(b"[]").unwrap();
        assert_eq!(storage.read_cache().unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn replace_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let storage = EventStorage::new(dir.path());
        storage.replace_cache(b"[]").unwrap();
        storage.replace_cache(b"[3]").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![CACHE_FILE.to_string()]);
    }

    #[test]
    fn uploads_land_under_fixed_names() {
        let dir = tempdir().unwrap();
        let storage = EventStorage::new(dir.path());

        storage.store_upload(FileType::Xml, b"<x/>").unwrap();
        storage.store_upload(FileType::Csv, b"a,b").unwrap();

        assert_eq!(fs::read(dir.path().join("events.xml")).unwrap(), b"<x/>");
        assert_eq!(fs::read(dir.path().join("calendar.csv")).unwrap(), b"a,b");
    }
}
