//! Bindings from opaque array handles to their current [`Version`].
//!
//! The directory is the only mutable state in the system. A handle is created pointing at some
//! version and is later rebound to newer versions of the same array. Rebinding is a
//! compare-and-swap on the version the caller last observed, so two writers racing on one handle
//! cannot silently discard each other's update.

use core::{fmt, ops::Deref};

use crate::tree::Version;

mod error;
pub use error::DirectoryError;

mod memory;
pub use memory::MemoryDirectory;

// HANDLE
// ================================================================================================

/// An opaque external identifier for an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

// DIRECTORY TRAIT
// ================================================================================================

/// Storage for handle bindings.
///
/// A binding record is `{ handle, root, length }`. Binding a handle never touches the node store,
/// so cloning an array is O(1) regardless of its size.
pub trait VersionDirectory: 'static + fmt::Debug + Send + Sync {
    /// Creates a fresh handle bound to `version` and returns it.
    ///
    /// # Errors
    /// Returns `DirectoryError::Backend` if the write fails.
    fn bind(&self, version: Version) -> Result<Handle, DirectoryError>;

    /// Returns the version `handle` is currently bound to.
    ///
    /// # Errors
    /// - `DirectoryError::UnknownHandle` if the handle was never bound.
    /// - `DirectoryError::Backend` if the read fails.
    fn resolve(&self, handle: Handle) -> Result<Version, DirectoryError>;

    /// Atomically rebinds `handle` from `expected` to `new`.
    ///
    /// # Errors
    /// - `DirectoryError::UnknownHandle` if the handle was never bound.
    /// - `DirectoryError::RebindConflict` if the handle is no longer bound to `expected`. The
    ///   binding is left untouched and the caller may retry against the current version.
    fn rebind(&self, handle: Handle, expected: Version, new: Version)
        -> Result<(), DirectoryError>;

    /// Returns all handles bound so far.
    fn handles(&self) -> Result<Vec<Handle>, DirectoryError>;
}

// Blanket impl to allow any pointer to a `VersionDirectory` to be used as a directory.
impl<P, T> VersionDirectory for P
where
    P: Deref<Target = T> + fmt::Debug + Send + Sync + 'static,
    T: VersionDirectory + ?Sized,
{
    #[inline]
    fn bind(&self, version: Version) -> Result<Handle, DirectoryError> {
        self.deref().bind(version)
    }

    #[inline]
    fn resolve(&self, handle: Handle) -> Result<Version, DirectoryError> {
        self.deref().resolve(handle)
    }

    #[inline]
    fn rebind(
        &self,
        handle: Handle,
        expected: Version,
        new: Version,
    ) -> Result<(), DirectoryError> {
        self.deref().rebind(handle, expected, new)
    }

    #[inline]
    fn handles(&self) -> Result<Vec<Handle>, DirectoryError> {
        self.deref().handles()
    }
}

/// Checks that a handle currently bound to `current` may move from `expected`.
pub(crate) fn check_rebind(
    handle: Handle,
    current: Version,
    expected: Version,
) -> Result<(), DirectoryError> {
    if current == expected {
        Ok(())
    } else {
        Err(DirectoryError::RebindConflict {
            handle,
            expected: expected.root(),
            actual: current.root(),
        })
    }
}
