//! On-disk storage backend backed by redb.
//!
//! A single database file holds every stored credential, which keeps the
//! token store durable across CLI invocations without any native
//! dependencies. All redb calls run on the Tokio blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{StorageBackend, StorageError};

/// The single table holding every key.
const DATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("portal");

/// A storage backend backed by a redb database file.
///
/// # Examples
///
/// ```no_run
/// # use portal_storage::RedbBackend;
/// let backend = RedbBackend::open("/home/me/.portal/tokens.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create the database file at `path`, creating parent
    /// directories as needed.
    ///
    /// On Unix the file is restricted to the owner (`0600`) since it holds
    /// bearer tokens.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory or file cannot be
    /// created, or [`StorageError::Transaction`] if the table cannot be
    /// initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }

        let db = Database::create(path).map_err(|e| open_err(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            {
                tracing::warn!(path = %path.display(), error = %e, "could not restrict token store permissions");
            }
        }

        // Creating the table up front lets readers open it without a write txn.
        let txn = db.begin_write().map_err(|e| StorageError::Transaction {
            reason: e.to_string(),
        })?;
        txn.open_table(DATA_TABLE)
            .map_err(|e| StorageError::MissingTable {
                name: format!("portal: {e}"),
            })?;
        txn.commit().map_err(|e| StorageError::Transaction {
            reason: e.to_string(),
        })?;

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Filesystem path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Transaction {
                reason: format!("blocking task failed: {e}"),
            })?
    }
}

fn missing_table(e: &impl std::fmt::Display) -> StorageError {
    StorageError::MissingTable {
        name: format!("portal: {e}"),
    }
}

fn txn_failed(e: &impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_owned();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(|e| txn_failed(&e))?;
            let table = txn.open_table(DATA_TABLE).map_err(|e| missing_table(&e))?;
            let value = table
                .get(key.as_str())
                .map_err(|e| StorageError::Read {
                    key: key.clone(),
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_owned();
        let value = value.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(|e| txn_failed(&e))?;
            {
                let mut table = txn.open_table(DATA_TABLE).map_err(|e| missing_table(&e))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| StorageError::Write {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(|e| StorageError::Write {
                key,
                reason: e.to_string(),
            })
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_owned();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(|e| txn_failed(&e))?;
            {
                let mut table = txn.open_table(DATA_TABLE).map_err(|e| missing_table(&e))?;
                table
                    .remove(key.as_str())
                    .map_err(|e| StorageError::Delete {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(|e| StorageError::Delete {
                key,
                reason: e.to_string(),
            })
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.to_owned();
        self.blocking(move |db| {
            let list_err = |e: &dyn std::fmt::Display| StorageError::List {
                prefix: prefix.clone(),
                reason: e.to_string(),
            };
            let txn = db.begin_read().map_err(|e| txn_failed(&e))?;
            let table = txn.open_table(DATA_TABLE).map_err(|e| missing_table(&e))?;

            let mut keys = Vec::new();
            for item in table.range(prefix.as_str()..).map_err(|e| list_err(&e))? {
                let (k, _) = item.map_err(|e| list_err(&e))?;
                let key = k.value();
                if !key.starts_with(prefix.as_str()) {
                    break;
                }
                keys.push(key.to_owned());
            }
            Ok(keys)
        })
        .await
    }
}
