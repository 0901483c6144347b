use core::cmp;

/// Settings for [`crate::VersionedArrays`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraysConfig {
    pub(crate) max_rebind_attempts: usize,
}

impl ArraysConfig {
    /// Creates the default configuration: a single rebind attempt per update, so a concurrent
    /// writer surfaces as [`crate::ArrayError::RebindConflict`].
    pub fn new() -> Self {
        Self { max_rebind_attempts: 1 }
    }

    /// Sets how many times an update re-reads its handle and recomputes the new version after
    /// losing a rebind race. Values below one are raised to one.
    pub fn with_max_rebind_attempts(mut self, attempts: usize) -> Self {
        self.max_rebind_attempts = cmp::max(attempts, 1);
        self
    }

    pub fn max_rebind_attempts(&self) -> usize {
        self.max_rebind_attempts
    }
}

impl Default for ArraysConfig {
    fn default() -> Self {
        Self::new()
    }
}
