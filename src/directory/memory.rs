use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use log::debug;

use super::{DirectoryError, Handle, VersionDirectory, check_rebind};
use crate::{Map, tree::Version};

/// In-memory handle bindings.
///
/// Handles are drawn from a monotonically increasing counter. The rebind check and the write
/// happen under the same write lock, which makes [`VersionDirectory::rebind`] a true
/// compare-and-swap.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    bindings: RwLock<Map<Handle, Version>>,
    next_handle: AtomicU64,
}

impl MemoryDirectory {
    /// Creates a new directory with no bindings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionDirectory for MemoryDirectory {
    fn bind(&self, version: Version) -> Result<Handle, DirectoryError> {
        let handle = Handle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.bindings.write()?.insert(handle, version);
        debug!("bound {handle} to {version}");
        Ok(handle)
    }

    fn resolve(&self, handle: Handle) -> Result<Version, DirectoryError> {
        self.bindings
            .read()?
            .get(&handle)
            .copied()
            .ok_or(DirectoryError::UnknownHandle(handle))
    }

    fn rebind(
        &self,
        handle: Handle,
        expected: Version,
        new: Version,
    ) -> Result<(), DirectoryError> {
        let mut bindings = self.bindings.write()?;
        let current = bindings.get_mut(&handle).ok_or(DirectoryError::UnknownHandle(handle))?;
        check_rebind(handle, *current, expected)?;
        *current = new;
        debug!("rebound {handle} from {expected} to {new}");
        Ok(())
    }

    fn handles(&self) -> Result<Vec<Handle>, DirectoryError> {
        let mut handles = self.bindings.read()?.keys().copied().collect::<Vec<_>>();
        // `hashmaps` iteration order is arbitrary
        handles.sort();
        Ok(handles)
    }
}
