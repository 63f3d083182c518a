//! Aggregate progress counters kept alongside a [`crate::Task`].

/// Total/done pairs for bytes, files, and directories, plus the
/// conflict/symlink/specials counts accumulated during `Estimate`.
///
/// Invariant: `*_done <= *_total` at every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Total bytes to move/copy, as computed by `Estimate`.
    pub bytes_total: u64,
    /// Bytes moved/copied so far.
    pub bytes_done: u64,
    /// Total regular files.
    pub files_total: u64,
    /// Regular files completed.
    pub files_done: u64,
    /// Total directories.
    pub dirs_total: u64,
    /// Directories completed (their `rmdir`/`mkdir` issued).
    pub dirs_done: u64,
    /// Destination paths that already existed at estimate time.
    pub conflicts: u64,
    /// Symlinks encountered.
    pub symlinks: u64,
    /// Entries that are neither regular files, directories, nor
    /// symlinks (fifos, sockets, device nodes).
    pub specials: u64,
}

impl Counters {
    /// True iff every `*_done` counter is within its `*_total` bound.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.bytes_done <= self.bytes_total
            && self.files_done <= self.files_total
            && self.dirs_done <= self.dirs_total
    }
}
