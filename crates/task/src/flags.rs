//! The task-flag bitset, modeled as a plain struct of booleans rather
//! than a packed integer — one named field per option rather than
//! hand-rolled bit twiddling.

/// Composable behavior switches for a [`crate::Task`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFlags {
    /// Copy symlinks by literal target string.
    pub raw_links: bool,
    /// Rewrite relative symlink targets to remain valid at the new
    /// location.
    pub recalculate_links: bool,
    /// Follow symlinks; the walker reports the target's type.
    pub deref_links: bool,
    /// Omit symlinks from the operation.
    pub skip_links: bool,
    /// Unlink an existing destination before writing.
    pub overwrite_conflicts: bool,
    /// Overwrite the next conflict only; auto-clears after use.
    pub overwrite_once: bool,
    /// Surface a conflict to the caller instead of resolving it.
    pub ask_conflicts: bool,
    /// Silently skip conflicting entries.
    pub skip_conflicts: bool,
    /// Apply chmod to all descendants, not only the top-level entry.
    pub recursive_chmod: bool,
}

impl TaskFlags {
    /// All flags unset.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}
