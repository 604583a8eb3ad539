use std::{fs, ops::ControlFlow};

use lmdb::{
    Cursor, Database, DatabaseFlags, Environment, EnvironmentFlags, Transaction, WriteFlags,
};
use tracing::info;

use super::{Config, Error, Result, Store};

/// Filename for the LMDB database created by the evidence store.
const STORAGE_DB_FILENAME: &str = "evidence.lmdb";

/// Maximum number of concurrent read transactions.
const MAX_READERS: u32 = 126;

/// LMDB version of a store.
#[derive(Debug)]
pub struct LmdbStore {
    env: Environment,
    db: Database,
}

impl LmdbStore {
    /// Opens the database below `config.path`, creating it if necessary.
    pub fn new(config: &Config) -> Result<Self> {
        if !config.path.exists() {
            fs::create_dir_all(&config.path)
                .map_err(|err| Error::CreateDatabaseDirectory(config.path.clone(), err))?;
        }
        let db_path = config.path.join(STORAGE_DB_FILENAME);

        let env = Environment::new()
            .set_flags(
                // We manage our own directory.
                EnvironmentFlags::NO_SUB_DIR
                // Disable thread local storage, strongly suggested for operation with tokio.
                | EnvironmentFlags::NO_TLS
                // Disable read-ahead, prefix scans touch few pages.
                | EnvironmentFlags::NO_READAHEAD,
            )
            .set_max_readers(MAX_READERS)
            .set_map_size(config.max_evidence_store_size)
            .open(&db_path)?;
        let db = env.create_db(None, DatabaseFlags::empty())?;

        info!("opened DB at {}", db_path.display());

        Ok(LmdbStore { env, db })
    }
}

impl Store for LmdbStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.put(self.db, &key, &value, WriteFlags::NO_OVERWRITE) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::KeyExist) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(value) => Some(value.to_vec()),
            Err(lmdb::Error::NotFound) => None,
            Err(error) => return Err(error.into()),
        };
        txn.commit()?;
        Ok(value)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        let txn = self.env.begin_ro_txn()?;
        let found = match txn.get(self.db, &key) {
            Ok(_) => true,
            Err(lmdb::Error::NotFound) => false,
            Err(error) => return Err(error.into()),
        };
        txn.commit()?;
        Ok(found)
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<()> {
        let txn = self.env.begin_ro_txn()?;
        {
            let mut cursor = txn.open_ro_cursor(self.db)?;
            for row in cursor.iter_from(prefix) {
                let (key, value) = row?;
                if !key.starts_with(prefix) {
                    break;
                }
                if visitor(key, value).is_break() {
                    break;
                }
            }
        }
        txn.commit()?;
        Ok(())
    }
}
