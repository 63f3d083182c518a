//! The closed sets a [`crate::Task`] moves through: what it does
//! ([`TaskKind`]) and where it is in its lifecycle ([`TaskPhase`]).

/// What a task does to its walked entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Delete the walked subtree.
    Remove,
    /// Duplicate the walked subtree at the destination.
    Copy,
    /// Relocate the walked subtree to the destination.
    Move,
    /// Apply a mode/ownership change to the walked subtree.
    Chmod,
}

impl TaskKind {
    /// Noun, present-participle, and past-participle forms, for
    /// `tracing` span names and log messages only — UI-facing prompt
    /// text stays external.
    #[must_use]
    pub fn as_verb_forms(self) -> (&'static str, &'static str, &'static str) {
        match self {
            TaskKind::Remove => ("remove", "removing", "removed"),
            TaskKind::Copy => ("copy", "copying", "copied"),
            TaskKind::Move => ("move", "moving", "moved"),
            TaskKind::Chmod => ("chmod", "chmodding", "chmodded"),
        }
    }

    /// True iff this kind reads from the source and writes a copy at
    /// the destination (`Copy` or `Move`).
    #[must_use]
    pub fn copies(self) -> bool {
        matches!(self, TaskKind::Copy | TaskKind::Move)
    }

    /// True iff this kind removes the source after it is done with it
    /// (`Remove` or `Move`).
    #[must_use]
    pub fn removes_source(self) -> bool {
        matches!(self, TaskKind::Remove | TaskKind::Move)
    }
}

/// Where a [`crate::Task`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    /// Freshly constructed, not yet estimated.
    Clean,
    /// Walking the source to compute totals and detect conflicts.
    Estimate,
    /// Estimate complete; awaiting the user's go-ahead.
    Confirm,
    /// Performing the operation.
    Running,
    /// Suspended by the user; `do_step` is a no-op until resumed.
    Paused,
    /// A step failed; the last error and cursor position are
    /// preserved for the caller to retry or abort.
    Failed,
    /// Complete (successfully or by abort); resources released.
    Finished,
}
