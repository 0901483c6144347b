use log::{debug, warn};

use crate::{
    ArrayError, ArraysConfig, DirectoryError, Handle, MemoryDirectory, MemoryNodeStore, NodeStore,
    SegmentForest, Value, Version, VersionDirectory,
};


// VERSIONED ARRAYS
// ================================================================================================

/// Versioned arrays addressed by opaque handles.
///
/// Each handle is bound to the current [`Version`] of one array. Updates build a new version by
/// path copying and then rebind the handle with a compare-and-swap, so a handle only ever moves
/// to a fully built tree. Cloning binds a second handle to the same version; the two handles then
/// evolve independently while sharing every node they have in common.
///
/// All indices are 0-based.
///
/// Example usage:
///
/// ```rust
/// use seg_forest::VersionedArrays;
///
/// let arrays = VersionedArrays::in_memory();
/// let original = arrays.create_array(&[1, 2, 3, 4]).unwrap();
/// let copy = arrays.clone_array(original).unwrap();
///
/// arrays.update_array(original, 1, 10).unwrap();
/// assert_eq!(arrays.query_array(original, 0, 3).unwrap(), 18);
/// assert_eq!(arrays.query_array(copy, 0, 3).unwrap(), 10);
/// ```
#[derive(Debug)]
pub struct VersionedArrays<S, D> {
    forest: SegmentForest<S>,
    directory: D,
    config: ArraysConfig,
}

impl VersionedArrays<MemoryNodeStore, MemoryDirectory> {
    /// Creates arrays backed entirely by memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryNodeStore::new(), MemoryDirectory::new())
    }
}

impl<S: NodeStore, D: VersionDirectory> VersionedArrays<S, D> {
    // CONSTRUCTORS
    // --------------------------------------------------------------------------------------------

    pub fn new(store: S, directory: D) -> Self {
        Self::with_config(store, directory, ArraysConfig::default())
    }

    pub fn with_config(store: S, directory: D, config: ArraysConfig) -> Self {
        Self {
            forest: SegmentForest::new(store),
            directory,
            config,
        }
    }

    // PUBLIC ACCESSORS
    // --------------------------------------------------------------------------------------------

    pub fn forest(&self) -> &SegmentForest<S> {
        &self.forest
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn config(&self) -> ArraysConfig {
        self.config
    }

    /// Returns the version `handle` is currently bound to.
    pub fn version(&self, handle: Handle) -> Result<Version, ArrayError> {
        Ok(self.directory.resolve(handle)?)
    }

    /// Returns all handles created so far.
    pub fn handles(&self) -> Result<Vec<Handle>, ArrayError> {
        Ok(self.directory.handles()?)
    }

    /// Returns the sum of the elements of `handle`'s array in `[left, right]`, clamped to the
    /// array bounds. An empty or fully out-of-bounds range sums to zero.
    ///
    /// # Errors
    /// Returns `UnknownHandle` if the handle is not bound.
    pub fn query_array(&self, handle: Handle, left: usize, right: usize) -> Result<Value, ArrayError> {
        let version = self.directory.resolve(handle)?;
        Ok(self.forest.query(version, left, right)?)
    }

    /// Returns the element at `index` of `handle`'s array.
    ///
    /// # Errors
    /// - `UnknownHandle` if the handle is not bound.
    /// - `OutOfRange` if `index` is past the end of the array.
    pub fn read_array(&self, handle: Handle, index: usize) -> Result<Value, ArrayError> {
        let version = self.directory.resolve(handle)?;
        Ok(self.forest.get(version, index)?)
    }

    /// Returns every element of `handle`'s array in index order.
    pub fn array_values(&self, handle: Handle) -> Result<Vec<Value>, ArrayError> {
        let version = self.directory.resolve(handle)?;
        Ok(self.forest.leaves(version)?)
    }

    // STATE MUTATORS
    // --------------------------------------------------------------------------------------------

    /// Builds a new array holding `values` and binds a fresh handle to it.
    ///
    /// # Errors
    /// Returns `EmptyArray` if `values` is empty.
    pub fn create_array(&self, values: &[Value]) -> Result<Handle, ArrayError> {
        let version = self.forest.build(values)?;
        let handle = self.directory.bind(version)?;
        debug!("created array {handle} at {version}");
        Ok(handle)
    }

    /// Sets the element at `index` of `handle`'s array to `value` and returns the new version.
    ///
    /// The handle is rebound only after the new version is fully written. If another writer
    /// rebinds the handle in between, the update is recomputed against the newer version up to
    /// [`ArraysConfig::max_rebind_attempts`] times in total before `RebindConflict` is returned.
    ///
    /// # Errors
    /// - `UnknownHandle` if the handle is not bound.
    /// - `OutOfRange` if `index` is past the end of the array.
    /// - `RebindConflict` if every attempt lost the race for the handle.
    ///
    /// The binding is unchanged whenever an error is returned.
    pub fn update_array(
        &self,
        handle: Handle,
        index: usize,
        value: Value,
    ) -> Result<Version, ArrayError> {
        let mut attempt = 1;
        loop {
            let current = self.directory.resolve(handle)?;
            let updated = self.forest.update(current, index, value)?;

            match self.directory.rebind(handle, current, updated) {
                Ok(()) => return Ok(updated),
                Err(DirectoryError::RebindConflict { actual, .. })
                    if attempt < self.config.max_rebind_attempts =>
                {
                    warn!(
                        "update of {handle} lost the rebind race to root {actual} (attempt {attempt}), retrying"
                    );
                    attempt += 1;
                },
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Binds a new handle to the current version of `handle`.
    ///
    /// No nodes are read or written: the clone shares the whole tree until either handle is
    /// updated.
    ///
    /// # Errors
    /// Returns `UnknownHandle` if the handle is not bound.
    pub fn clone_array(&self, handle: Handle) -> Result<Handle, ArrayError> {
        let version = self.directory.resolve(handle)?;
        let clone = self.directory.bind(version)?;
        debug!("cloned {handle} into {clone} at {version}");
        Ok(clone)
    }

    /// Binds a new handle to `version`, which may be any version previously returned by this
    /// instance, including ones no handle points at anymore.
    ///
    /// The root is read once to make sure the version is present in the store.
    pub fn checkout(&self, version: Version) -> Result<Handle, ArrayError> {
        self.forest.total(version)?;
        let handle = self.directory.bind(version)?;
        debug!("checked out {version} into {handle}");
        Ok(handle)
    }
}
