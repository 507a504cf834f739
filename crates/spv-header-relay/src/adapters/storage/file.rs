use crate::domain::StorageError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Single-file key-value store.
///
/// The whole map is held in memory and rewritten on every mutation through
/// a temp file and rename, so the file on disk is always a complete
/// snapshot. Every batch clones the map and rewrites the full snapshot,
/// which costs O(total stored headers) per commit regardless of batch size.
/// Suitable for relays with modest header counts; larger hosts plug in an
/// incremental engine behind [`KeyValueStore`].
///
/// The temp file is `<file name>.tmp` beside the snapshot, so stores with
/// distinct file names in one directory never share it.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data: BTreeMap<Vec<u8>, Vec<u8>> =
                    bincode::deserialize(&bytes).map_err(|e| StorageError::Corruption {
                        message: format!("{}: {}", path.display(), e),
                    })?;
                tracing::info!("Loaded {} keys from {}", data.len(), path.display());
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No existing storage file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(io_error(e)),
        };

        Ok(Self { data, path })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn save(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), StorageError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let bytes = bincode::serialize(data)?;

        let temp_path = self.temp_path();
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;

        std::fs::rename(&temp_path, &self.path).map_err(io_error)
    }

    /// Apply `ops` to a copy, persist it, then swap it in.
    fn apply(&mut self, ops: Vec<BatchOperation>) -> Result<(), StorageError> {
        let mut next = self.data.clone();
        for op in ops {
            match op {
                BatchOperation::Put { key, value } => {
                    next.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    next.remove(&key);
                }
            }
        }
        self.save(&next)?;
        self.data = next;
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io {
        message: e.to_string(),
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(
        &mut self,
        operations: Vec<BatchOperation>,
    ) -> Result<(), StorageError> {
        self.apply(operations)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, StorageError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
