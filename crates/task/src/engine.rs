//! The [`Task`] struct: construction, lifecycle transitions, and the
//! `Estimate` action. The `Copy`/`Remove`/`Chmod` actions live in
//! [`crate::actions`], kept in their own file since each is a
//! self-contained state machine in its own right.

use path::{build_path, AbsPath};
use strlist::StringList;
use tracing::{instrument, warn};
use walk::{TreeWalk, WalkState};

use fmcore::{Error, Result};

use crate::chmod::ChmodParams;
use crate::config::TaskConfig;
use crate::counters::Counters;
use crate::flags::TaskFlags;
use crate::kind::{TaskKind, TaskPhase};

/// What a [`Task::do_step`] call accomplished before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The budget ran out; call `do_step` again to continue.
    BudgetExhausted,
    /// The current phase ran to completion (`Estimate` → `Confirm`, or
    /// the action phase → `Finished`).
    PhaseComplete,
    /// A step failed; see [`Task::last_error`]. The phase is now
    /// `Failed`; call [`Task::retry`] or [`Task::abort`].
    Failed,
    /// The task was paused, finished, or otherwise not steppable; the
    /// call was a no-op.
    Inactive,
}

/// A conflict resolution decision for a single destination entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConflictOutcome {
    /// No conflict (or it was resolved); proceed with the create.
    Proceed,
    /// A conflict exists and the active flag says to leave the
    /// destination alone.
    Skip,
}

/// A budgeted, resumable copy/move/remove/chmod operation over a set
/// of source entries.
///
/// Construct with [`Task::new`], drive with repeated [`Task::do_step`]
/// calls (after [`Task::confirm`] once `Estimate` completes), and read
/// [`Task::counters`] for progress.
pub struct Task {
    pub(crate) src_root: AbsPath,
    pub(crate) dst_root: AbsPath,
    pub(crate) sources: StringList,
    pub(crate) renamed: StringList,
    pub(crate) current_index: usize,
    pub(crate) kind: TaskKind,
    pub(crate) flags: TaskFlags,
    pub(crate) chmod: ChmodParams,
    pub(crate) config: TaskConfig,
    pub(crate) phase: TaskPhase,
    pub(crate) counters: Counters,
    last_error: Option<String>,
    pub(crate) walker: Option<TreeWalk>,
    pub(crate) pending_event: Option<WalkState>,
    pub(crate) in_file: Option<std::fs::File>,
    pub(crate) out_file: Option<std::fs::File>,
    pub(crate) same_device: Option<bool>,
}

impl Task {
    /// Construct a task. Takes ownership of `sources`/`renamed` (the
    /// panel's selection snapshot); `chmod` is only meaningful for
    /// [`TaskKind::Chmod`].
    ///
    /// Phase starts at `Estimate` directly; a freshly constructed task
    /// has no separate "not yet started" phase to occupy.
    #[must_use]
    pub fn new(
        kind: TaskKind,
        flags: TaskFlags,
        src_root: AbsPath,
        dst_root: AbsPath,
        sources: StringList,
        renamed: StringList,
        chmod: ChmodParams,
        config: TaskConfig,
    ) -> Self {
        Task {
            src_root,
            dst_root,
            sources,
            renamed,
            current_index: 0,
            kind,
            flags,
            chmod,
            config,
            phase: TaskPhase::Estimate,
            counters: Counters::default(),
            last_error: None,
            walker: None,
            pending_event: None,
            in_file: None,
            out_file: None,
            same_device: None,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// This task's kind.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Aggregate progress counters.
    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The message of the most recent step failure, if the task is in
    /// (or has passed through) `Failed`.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Move from `Confirm` to `Running`, resetting the walk cursor so
    /// the action phase re-walks each source from its root.
    pub fn confirm(&mut self) {
        self.phase = TaskPhase::Running;
        self.current_index = 0;
        self.walker = None;
        self.pending_event = None;
    }

    /// Suspend stepping; `do_step` becomes a no-op until [`Task::resume`].
    pub fn pause(&mut self) {
        if self.phase == TaskPhase::Running {
            self.phase = TaskPhase::Paused;
        }
    }

    /// Resume a paused task.
    pub fn resume(&mut self) {
        if self.phase == TaskPhase::Paused {
            self.phase = TaskPhase::Running;
        }
    }

    /// Re-enter `Running`/`Estimate` after a `Failed` step, at the same
    /// walker position — no data is re-copied, since a partially
    /// copied file's descriptors remain open across retries.
    pub fn retry(&mut self) {
        if self.phase == TaskPhase::Failed {
            self.phase = if self.counters.files_total == 0 && self.counters.dirs_total == 0 {
                TaskPhase::Estimate
            } else {
                TaskPhase::Running
            };
        }
    }

    /// Arm the one-shot overwrite flag and retry the step that just
    /// failed with `EEXIST` — the response a UI gives when the user
    /// picks "overwrite" for a single conflicting entry.
    pub fn resolve_next_conflict_by_overwriting(&mut self) {
        self.flags.overwrite_once = true;
        self.retry();
    }

    /// Abort the task: release the walker and any open descriptors and
    /// move to `Finished`.
    ///
    /// A `Move` aborted mid-way across
    /// devices leaves whatever was already copied to the destination in
    /// place and the untouched remainder of the source intact — there
    /// is no rollback.
    pub fn abort(&mut self) {
        self.cleanup();
        self.phase = TaskPhase::Finished;
    }

    fn cleanup(&mut self) {
        self.walker = None;
        self.pending_event = None;
        self.in_file = None;
        self.out_file = None;
    }

    pub(crate) fn fail(&mut self, e: Error) -> TaskOutcome {
        warn!(error = %e, "task step failed");
        self.last_error = Some(e.to_string());
        self.phase = TaskPhase::Failed;
        TaskOutcome::Failed
    }

    /// Advance the task by one budgeted `do_step`. `budget` is a step
    /// count in `Estimate`, or a byte count in an action phase.
    ///
    /// Dispatches to the `Estimate` action, or to the `Copy`/`Remove`
    /// or `Chmod` action per [`Task::kind`].
    #[instrument(skip(self), fields(kind = ?self.kind, phase = ?self.phase, budget))]
    pub fn do_step(&mut self, budget: u64) -> TaskOutcome {
        match self.phase {
            TaskPhase::Estimate => self.run_estimate(budget),
            TaskPhase::Running => match self.kind {
                TaskKind::Chmod => self.run_chmod(budget),
                TaskKind::Copy | TaskKind::Move | TaskKind::Remove => self.run_copy_remove(budget),
            },
            TaskPhase::Clean
            | TaskPhase::Confirm
            | TaskPhase::Paused
            | TaskPhase::Failed
            | TaskPhase::Finished => TaskOutcome::Inactive,
        }
    }

    pub(crate) fn ensure_walker(&mut self) -> Result<bool> {
        loop {
            if self.walker.is_some() {
                return Ok(true);
            }
            if self.current_index >= self.sources.len() {
                return Ok(false);
            }
            match self.sources.get(self.current_index) {
                Some(name) => {
                    let mut root = self.src_root.clone();
                    root.push(name)?;
                    self.walker = Some(TreeWalk::new(root, self.flags.deref_links));
                    return Ok(true);
                }
                None => self.current_index += 1,
            }
        }
    }

    pub(crate) fn next_event(&mut self) -> Result<WalkState> {
        if let Some(ev) = self.pending_event.take() {
            return Ok(ev);
        }
        self.walker.as_mut().expect("ensure_walker called first").step()
    }

    pub(crate) fn current_rename_pair(&self) -> (String, String) {
        let s = self
            .sources
            .get(self.current_index)
            .unwrap_or_default()
            .to_owned();
        let r = self
            .renamed
            .get(self.current_index)
            .map(str::to_owned)
            .unwrap_or_else(|| s.clone());
        (s, r)
    }

    pub(crate) fn build_target_path(&self) -> Result<AbsPath> {
        let walker = self.walker.as_ref().expect("called during active walk");
        let (s, r) = self.current_rename_pair();
        build_path(walker.path(), &self.src_root, &self.dst_root, Some((&s, &r)))
    }

    fn run_estimate(&mut self, budget: u64) -> TaskOutcome {
        let mut spent: u64 = 0;
        loop {
            if spent >= budget {
                return TaskOutcome::BudgetExhausted;
            }
            match self.ensure_walker() {
                Ok(false) => {
                    self.phase = TaskPhase::Confirm;
                    return TaskOutcome::PhaseComplete;
                }
                Err(e) => return self.fail(e),
                Ok(true) => {}
            }
            let event = match self.next_event() {
                Ok(ev) => ev,
                Err(e) => return self.fail(e),
            };
            spent += 1;

            match event {
                WalkState::Exit => {
                    self.current_index += 1;
                    self.walker = None;
                }
                WalkState::DirEnd => {}
                WalkState::Link => {
                    if !(self.flags.raw_links
                        || self.flags.deref_links
                        || self.flags.skip_links
                        || self.flags.recalculate_links)
                    {
                        self.pending_event = Some(event);
                        return self.fail(Error::Conflict(
                            "no link policy flag set for this operation".to_owned(),
                        ));
                    }
                    self.counters.symlinks += 1;
                    self.counters.files_total += 1;
                    self.estimate_size_and_conflict();
                }
                WalkState::File => {
                    self.counters.files_total += 1;
                    self.estimate_size_and_conflict();
                }
                WalkState::Dir => {
                    self.counters.dirs_total += 1;
                    self.estimate_size_and_conflict();
                }
                WalkState::Special => {
                    self.counters.specials += 1;
                }
            }
        }
    }

    fn estimate_size_and_conflict(&mut self) {
        let size = self
            .walker
            .as_ref()
            .map(|w| w.current_stat().size)
            .unwrap_or(0);
        self.counters.bytes_total += size;

        if self.kind.copies() {
            if let Ok(target) = self.build_target_path() {
                if std::fs::symlink_metadata(target.as_str()).is_ok() {
                    self.counters.conflicts += 1;
                }
            }
        }
    }
}
