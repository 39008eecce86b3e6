//! Context manager configuration
//!
//! Process-wide knobs for the context manager's diagnostics and per-thread
//! allocation. Installed once at startup via
//! `ContextManager::configure`; every thread reads the active config.

/// Context manager settings
///
/// # Example
///
/// ```
/// use strata_context_core::ManagerConfig;
///
/// let config = ManagerConfig {
///     depth_warning_threshold: Some(32),
///     ..ManagerConfig::default()
/// };
/// assert!(config.warn_on_mismatch);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Emit a warning when a detach token does not match the stack depth (default: true)
    pub warn_on_mismatch: bool,

    /// Capacity reserved for a thread's attach stack on first use (default: 8)
    pub initial_stack_capacity: usize,

    /// Warn when an attach pushes the stack past this depth (default: 256)
    ///
    /// Deep stacks almost always mean attaches that are never detached.
    /// `None` disables the check.
    pub depth_warning_threshold: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            warn_on_mismatch: true,
            initial_stack_capacity: 8,
            depth_warning_threshold: Some(256),
        }
    }
}

impl ManagerConfig {
    /// Config with all diagnostics disabled
    ///
    /// Useful for tests that deliberately unbalance the stack.
    pub fn quiet() -> Self {
        ManagerConfig {
            warn_on_mismatch: false,
            depth_warning_threshold: None,
            ..ManagerConfig::default()
        }
    }

    /// Whether attaching to `depth` crosses the warning threshold
    ///
    /// True only on the attach that first exceeds the threshold, so a
    /// leaking loop warns once per crossing rather than on every attach.
    pub fn crosses_depth_threshold(&self, depth: usize) -> bool {
        matches!(self.depth_warning_threshold, Some(limit) if depth == limit + 1)
    }
}
