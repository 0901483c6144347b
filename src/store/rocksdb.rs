use core::cmp;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use log::{debug, trace};
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DB, DBCompressionType,
    FlushOptions, IteratorMode, Options, WriteBatch,
};
use winter_utils::{Deserializable, DeserializationError, Serializable};

use super::{NodeStore, StoreError};
use crate::{
    directory::{DirectoryError, Handle, VersionDirectory, check_rebind},
    tree::{Node, NodeId, Version},
};

/// The name of the RocksDB column family holding node records, keyed by big-endian node id.
const NODES_CF: &str = "nodes";
/// The name of the RocksDB column family holding handle bindings, keyed by big-endian handle.
const HANDLES_CF: &str = "handles";
/// The name of the RocksDB column family holding the identifier counters.
const METADATA_CF: &str = "metadata";

/// The key in `METADATA_CF` of the next node identifier to assign.
const NEXT_NODE_KEY: &[u8] = b"next_node";
/// The key in `METADATA_CF` of the next handle to assign.
const NEXT_HANDLE_KEY: &[u8] = b"next_handle";

// CONFIG
// ================================================================================================

/// Settings for opening a [`RocksDbStorage`].
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// The directory holding the database files.
    pub(crate) path: PathBuf,
    /// The size of the shared block cache in bytes.
    pub(crate) cache_size: usize,
    /// The maximum number of files RocksDB keeps open.
    pub(crate) max_open_files: i32,
}

impl RocksDbConfig {
    /// Creates a configuration for a database at `path` with a 128 MB block cache and up to 256
    /// open files.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cache_size: 128 << 20,
            max_open_files: 256,
        }
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_max_open_files(mut self, count: i32) -> Self {
        self.max_open_files = cmp::max(count, 1);
        self
    }
}

// STORAGE
// ================================================================================================

#[derive(Debug)]
struct Counters {
    next_node: u64,
    next_handle: u64,
}

/// Durable storage for both node records and handle bindings in a single RocksDB database.
///
/// The database uses three column families:
/// - `nodes`: serialized [`Node`] records keyed by [`NodeId`]. Records are written once.
/// - `handles`: serialized [`Version`] bindings keyed by [`Handle`].
/// - `metadata`: the next node identifier and the next handle.
///
/// Every create or bind writes its record together with the advanced counter in one
/// `WriteBatch`, so a reopened database never hands out an identifier twice. Writers are
/// serialized by an internal mutex shared between clones; reads go straight to the database.
#[derive(Debug, Clone)]
pub struct RocksDbStorage {
    db: Arc<DB>,
    counters: Arc<Mutex<Counters>>,
}

impl RocksDbStorage {
    /// Opens or creates a database as described by `config`.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the database cannot be opened, or `StoreError::BadKeyLen`
    /// if the stored counters are malformed.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);

        let cache = Cache::new_lru_cache(config.cache_size);
        let mut table_opts = BlockBasedOptions::default();
        table_opts.set_block_cache(&cache);
        table_opts.set_bloom_filter(10.0, false);
        table_opts.set_whole_key_filtering(true);

        // nodes are only ever appended, with keys in increasing order
        let mut nodes_opts = Options::default();
        nodes_opts.set_block_based_table_factory(&table_opts);
        nodes_opts.set_compression_type(DBCompressionType::Lz4);

        let mut handles_opts = Options::default();
        handles_opts.set_block_based_table_factory(&table_opts);

        let mut metadata_opts = Options::default();
        metadata_opts.set_compression_type(DBCompressionType::None);

        let cfs = vec![
            ColumnFamilyDescriptor::new(NODES_CF, nodes_opts),
            ColumnFamilyDescriptor::new(HANDLES_CF, handles_opts),
            ColumnFamilyDescriptor::new(METADATA_CF, metadata_opts),
        ];

        let db = DB::open_cf_descriptors(&db_opts, &config.path, cfs)?;
        let mut storage = Self {
            db: Arc::new(db),
            counters: Arc::new(Mutex::new(Counters { next_node: 0, next_handle: 0 })),
        };

        let counters = Counters {
            next_node: storage.read_counter(NEXT_NODE_KEY)?,
            next_handle: storage.read_counter(NEXT_HANDLE_KEY)?,
        };
        debug!(
            "opened node storage at {} with {} nodes and {} handles",
            config.path.display(),
            counters.next_node,
            counters.next_handle
        );
        storage.counters = Arc::new(Mutex::new(counters));

        Ok(storage)
    }

    /// Flushes all column families to disk and waits for the flush to finish.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the flush fails.
    pub fn flush(&self) -> Result<(), StoreError> {
        let mut fopts = FlushOptions::default();
        fopts.set_wait(true);

        for name in [NODES_CF, HANDLES_CF, METADATA_CF] {
            let cf = self.cf_handle(name)?;
            self.db.flush_cf_opt(cf, &fopts)?;
        }
        Ok(())
    }

    // HELPERS
    // --------------------------------------------------------------------------------------------

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Unsupported(format!("unknown column family `{name}`")))
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64, StoreError> {
        let cf = self.cf_handle(METADATA_CF)?;
        match self.db.get_cf(cf, key)? {
            None => Ok(0),
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::BadKeyLen { expected: 8, found: bytes.len() })?;
                Ok(u64::from_le_bytes(raw))
            },
        }
    }
}

// NODE STORE
// ================================================================================================

impl NodeStore for RocksDbStorage {
    fn create(&self, node: Node) -> Result<NodeId, StoreError> {
        let nodes_cf = self.cf_handle(NODES_CF)?;
        let metadata_cf = self.cf_handle(METADATA_CF)?;

        let mut counters = self.counters.lock()?;
        let id = NodeId::new(counters.next_node);

        let mut batch = WriteBatch::default();
        batch.put_cf(nodes_cf, id.to_key(), node.to_bytes());
        batch.put_cf(metadata_cf, NEXT_NODE_KEY, (counters.next_node + 1).to_le_bytes());
        self.db.write(batch)?;

        counters.next_node += 1;
        trace!("created node {id}: {node:?}");
        Ok(id)
    }

    fn fetch(&self, id: NodeId) -> Result<Node, StoreError> {
        let cf = self.cf_handle(NODES_CF)?;
        match self.db.get_cf(cf, id.to_key())? {
            Some(bytes) => Ok(Node::read_from_bytes(&bytes)?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn node_count(&self) -> Result<usize, StoreError> {
        // identifiers are dense from zero
        Ok(self.counters.lock()?.next_node as usize)
    }
}

// VERSION DIRECTORY
// ================================================================================================

impl RocksDbStorage {
    fn read_binding(&self, handle: Handle) -> Result<Version, DirectoryError> {
        let cf = self.cf_handle(HANDLES_CF)?;
        match self.db.get_cf(cf, handle.as_u64().to_be_bytes())? {
            Some(bytes) => Ok(Version::read_from_bytes(&bytes)?),
            None => Err(DirectoryError::UnknownHandle(handle)),
        }
    }
}

impl VersionDirectory for RocksDbStorage {
    fn bind(&self, version: Version) -> Result<Handle, DirectoryError> {
        let handles_cf = self.cf_handle(HANDLES_CF)?;
        let metadata_cf = self.cf_handle(METADATA_CF)?;

        let mut counters = self.counters.lock()?;
        let handle = Handle::new(counters.next_handle);

        let mut batch = WriteBatch::default();
        batch.put_cf(handles_cf, handle.as_u64().to_be_bytes(), version.to_bytes());
        batch.put_cf(metadata_cf, NEXT_HANDLE_KEY, (counters.next_handle + 1).to_le_bytes());
        self.db.write(batch)?;

        counters.next_handle += 1;
        debug!("bound {handle} to {version}");
        Ok(handle)
    }

    fn resolve(&self, handle: Handle) -> Result<Version, DirectoryError> {
        self.read_binding(handle)
    }

    fn rebind(
        &self,
        handle: Handle,
        expected: Version,
        new: Version,
    ) -> Result<(), DirectoryError> {
        let cf = self.cf_handle(HANDLES_CF)?;

        // holding the writer lock makes the read-compare-write below atomic
        let _counters = self.counters.lock()?;
        check_rebind(handle, self.read_binding(handle)?, expected)?;
        self.db.put_cf(cf, handle.as_u64().to_be_bytes(), new.to_bytes())?;

        debug!("rebound {handle} from {expected} to {new}");
        Ok(())
    }

    fn handles(&self) -> Result<Vec<Handle>, DirectoryError> {
        let cf = self.cf_handle(HANDLES_CF)?;

        let mut handles = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            let raw: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                DeserializationError::InvalidValue(format!(
                    "handle key must be 8 bytes, found {}",
                    key.len()
                ))
            })?;
            handles.push(Handle::new(u64::from_be_bytes(raw)));
        }
        Ok(handles)
    }
}

// ERRORS
// ================================================================================================

impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::Backend(Box::new(e))
    }
}

impl From<rocksdb::Error> for DirectoryError {
    fn from(e: rocksdb::Error) -> Self {
        DirectoryError::Backend(Box::new(e))
    }
}

impl From<StoreError> for DirectoryError {
    fn from(e: StoreError) -> Self {
        DirectoryError::Backend(Box::new(e))
    }
}
