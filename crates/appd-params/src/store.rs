//! Directory-backed parameter store

use appd_host_api::{HostResult, ParamStore, ParamsMarker};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

use crate::{ParamsError, ParamsResult};

const TMP_PREFIX: &str = ".tmp_";

/// Parameter store backed by a directory of small files
#[derive(Debug, Clone)]
pub struct FileParams {
    dir: PathBuf,
}

impl FileParams {
    /// Open the store at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> ParamsResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Parameter store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a value, `Ok(None)` if the key has never been written
    pub fn read(&self, key: &str) -> ParamsResult<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a value atomically
    pub fn write(&self, key: &str, value: &str) -> ParamsResult<()> {
        let path = self.key_path(key)?;
        let tmp = self.dir.join(format!("{}{}", TMP_PREFIX, key));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(key, value, "Parameter written");
        Ok(())
    }

    /// Latest modification time of the directory or any key file, in
    /// nanoseconds since the epoch.
    ///
    /// The directory mtime catches keys being created, renamed or deleted;
    /// key mtimes catch values rewritten in place.
    pub fn marker(&self) -> ParamsResult<ParamsMarker> {
        let mut latest = mtime_nanos(&fs::metadata(&self.dir)?)?;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(TMP_PREFIX) {
                continue;
            }
            // Raced with a rename or delete; the directory mtime covers it
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            latest = latest.max(mtime_nanos(&metadata)?);
        }

        Ok(ParamsMarker::from_raw(latest))
    }

    fn key_path(&self, key: &str) -> ParamsResult<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.starts_with(TMP_PREFIX)
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !valid {
            return Err(ParamsError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

fn mtime_nanos(metadata: &fs::Metadata) -> ParamsResult<u128> {
    let modified = metadata.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0))
}

impl ParamStore for FileParams {
    fn get(&self, key: &str) -> Option<String> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read parameter");
                None
            }
        }
    }

    fn put(&self, key: &str, value: &str) -> HostResult<()> {
        self.write(key, value).map_err(Into::into)
    }

    fn last_modified(&self) -> Option<ParamsMarker> {
        match self.marker() {
            Ok(marker) => Some(marker),
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to stat parameter store");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();

        assert!(params.read("OpkrRunMixplorer").unwrap().is_none());
        assert!(params.get("OpkrRunMixplorer").is_none());
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();

        params.put("EnableNav", "1").unwrap();
        assert_eq!(params.get("EnableNav").as_deref(), Some("1"));

        params.put("EnableNav", "0").unwrap();
        assert_eq!(params.get("EnableNav").as_deref(), Some("0"));
        assert_eq!(
            fs::read_to_string(dir.path().join("EnableNav")).unwrap(),
            "0"
        );
    }

    #[test]
    fn values_written_by_other_processes_are_visible() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();

        fs::write(dir.path().join("OpkrRunQuickedit"), "-1").unwrap();
        assert_eq!(params.get("OpkrRunQuickedit").as_deref(), Some("-1"));
    }

    #[test]
    fn open_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("params").join("d");
        let params = FileParams::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(params.dir(), nested.as_path());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();

        params.put("A", "1").unwrap();
        params.put("B", "2").unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.starts_with(TMP_PREFIX)));
    }

    #[test]
    fn invalid_keys_rejected() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();

        assert!(matches!(
            params.write("../escape", "1"),
            Err(ParamsError::InvalidKey(_))
        ));
        assert!(matches!(params.read(""), Err(ParamsError::InvalidKey(_))));
        assert!(params.put(".tmp_A", "1").is_err());
        assert!(params.get("a/b").is_none());
    }

    #[test]
    fn marker_changes_on_in_place_overwrite() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();
        params.put("OpkrRunMixplorer", "0").unwrap();
        let before = params.last_modified();

        // Written the way a shell redirect does it: truncate, no rename
        std::thread::sleep(std::time::Duration::from_millis(50));
        fs::write(dir.path().join("OpkrRunMixplorer"), "1").unwrap();

        assert_eq!(params.get("OpkrRunMixplorer").as_deref(), Some("1"));
        assert_ne!(params.last_modified(), before);
    }

    #[test]
    fn marker_changes_on_atomic_write() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();
        params.put("EnableNav", "1").unwrap();
        let before = params.last_modified();

        std::thread::sleep(std::time::Duration::from_millis(50));
        params.put("EnableNav", "0").unwrap();

        assert_ne!(params.last_modified(), before);
    }

    #[test]
    fn marker_is_stable_without_writes() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path()).unwrap();
        params.put("A", "1").unwrap();

        let first = params.last_modified().unwrap();
        let second = params.last_modified().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn marker_missing_directory() {
        let dir = tempdir().unwrap();
        let params = FileParams::open(dir.path().join("gone")).unwrap();
        fs::remove_dir(params.dir()).unwrap();

        assert!(params.last_modified().is_none());
    }
}
