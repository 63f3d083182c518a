#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! [`TreeWalk`] is an iterative, single-step depth-first cursor over a
//! subtree. Unlike a recursive walker it never grows the call stack —
//! open directory handles live in an explicit [`Vec`] owned by the
//! cursor — so the task engine can suspend a walk mid-tree, return
//! control to a UI loop, and resume later without losing position.
//!
//! # Design
//!
//! Directory recursion is driven by an explicit queue rather than
//! recursive `fn` calls, so a transfer can be paused and its progress
//! inspected mid-flight. The state machine itself cycles
//! `Nowhere → {File,Link,Dir,Special} → DirEnd → Exit`, with a
//! parenthesis discipline between `Dir` and `DirEnd`.
//!
//! # Invariants
//!
//! - The directory-handle stack's depth always equals the path cursor's
//!   current nesting below the walk root.
//! - Every `Dir` event has a matching, later `DirEnd` event at the same
//!   nesting depth (the "parenthesis property").
//! - A failed `step` leaves the cursor's state unchanged, so a caller
//!   may retry, skip, or abort without losing position.

use std::fs::ReadDir;
use std::io;

use fmcore::{Error, Result};
use flist::{stat_from_metadata, Stat};
use path::AbsPath;
use tracing::instrument;

/// A tag identifying what the cursor currently points at, and (other
/// than `Nowhere` and `Exit`) the event `step` just emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Pre-start; the walk has not yet stat'd its root.
    Nowhere,
    /// The cursor identifies a regular file.
    File,
    /// The cursor identifies a symlink (opaque, or dangling under
    /// link-transparency).
    Link,
    /// The cursor identifies a directory, not yet entered.
    Dir,
    /// The directory entered at this nesting depth has no more entries.
    DirEnd,
    /// The cursor identifies something that is none of the above
    /// (fifo, socket, device node, ...).
    Special,
    /// Terminal; the walk is complete and further `step` calls are
    /// no-ops.
    Exit,
}

struct DirFrame {
    handle: ReadDir,
    saved_len: usize,
}

/// An iterative depth-first cursor over the subtree rooted at a given
/// path.
///
/// Construct with [`TreeWalk::new`], then call [`TreeWalk::step`]
/// repeatedly until it returns [`WalkState::Exit`].
pub struct TreeWalk {
    state: WalkState,
    link_transparent: bool,
    stack: Vec<DirFrame>,
    path: AbsPath,
    current_stat: Stat,
}

impl TreeWalk {
    /// A fresh cursor rooted at `root`, in state [`WalkState::Nowhere`].
    ///
    /// When `link_transparent` is set, a symlink encountered anywhere
    /// in the walk (including the root itself) is additionally
    /// `stat`ed and reclassified as [`WalkState::File`] or
    /// [`WalkState::Dir`] per its target.
    #[must_use]
    pub fn new(root: AbsPath, link_transparent: bool) -> Self {
        TreeWalk {
            state: WalkState::Nowhere,
            link_transparent,
            stack: Vec::new(),
            path: root,
            current_stat: Stat::default(),
        }
    }

    /// The cursor's current state.
    #[must_use]
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// The path the cursor currently identifies.
    #[must_use]
    pub fn path(&self) -> &AbsPath {
        &self.path
    }

    /// The `lstat` (or, under link-transparency, `stat`) metadata for
    /// the entry the cursor currently identifies. Meaningless before
    /// the first successful `step`.
    #[must_use]
    pub fn current_stat(&self) -> &Stat {
        &self.current_stat
    }

    /// Current nesting depth: the number of open directory handles.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Advance the cursor by one event.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `opendir`/`readdir`/`lstat` failure.
    /// The cursor's state is left unchanged on error, so a caller may
    /// retry the same step, or transition the walk to
    /// [`WalkState::Exit`] itself to abandon the subtree.
    #[instrument(skip(self), fields(path = %self.path, state = ?self.state))]
    pub fn step(&mut self) -> Result<WalkState> {
        match self.state {
            WalkState::Nowhere => self.classify_current(),
            WalkState::Exit => Ok(WalkState::Exit),
            WalkState::File | WalkState::Link | WalkState::Special => self.advance_after_leaf(),
            WalkState::Dir => self.enter_dir(),
            WalkState::DirEnd => self.leave_dir(),
        }
    }

    fn enter_dir(&mut self) -> Result<WalkState> {
        let handle =
            std::fs::read_dir(self.path.as_str()).map_err(|e| Error::from_io(self.path.as_str(), e))?;
        let saved_len = self.path.len();
        self.stack.push(DirFrame { handle, saved_len });
        self.read_next_in_top_frame()
    }

    fn leave_dir(&mut self) -> Result<WalkState> {
        let frame = self
            .stack
            .pop()
            .expect("DirEnd state implies a frame is open");
        debug_assert_eq!(self.path.len(), frame.saved_len);
        self.path.pop();
        if self.stack.is_empty() {
            self.state = WalkState::Exit;
            return Ok(WalkState::Exit);
        }
        self.read_next_in_top_frame()
    }

    fn advance_after_leaf(&mut self) -> Result<WalkState> {
        self.path.pop();
        if self.stack.is_empty() {
            self.state = WalkState::Exit;
            return Ok(WalkState::Exit);
        }
        self.read_next_in_top_frame()
    }

    fn read_next_in_top_frame(&mut self) -> Result<WalkState> {
        let frame = self.stack.last_mut().expect("caller checked non-empty");
        match frame.handle.next() {
            Some(Ok(entry)) => {
                let name = entry.file_name().to_string_lossy().into_owned();
                self.path.push(&name)?;
                self.classify_current()
            }
            Some(Err(e)) => Err(Error::from_io(self.path.as_str(), e)),
            None => {
                self.state = WalkState::DirEnd;
                Ok(WalkState::DirEnd)
            }
        }
    }

    fn classify_current(&mut self) -> Result<WalkState> {
        let meta = std::fs::symlink_metadata(self.path.as_str())
            .map_err(|e| Error::from_io(self.path.as_str(), e))?;
        let stat = stat_from_metadata(&meta);

        if stat.is_symlink() {
            if self.link_transparent {
                return self.classify_symlink_target(stat);
            }
            self.current_stat = stat;
            self.state = WalkState::Link;
            return Ok(WalkState::Link);
        }

        self.current_stat = stat;
        self.state = if stat.is_dir() {
            WalkState::Dir
        } else if stat.is_regular() {
            WalkState::File
        } else {
            WalkState::Special
        };
        Ok(self.state)
    }

    fn classify_symlink_target(&mut self, link_stat: Stat) -> Result<WalkState> {
        match std::fs::metadata(self.path.as_str()) {
            Ok(target_meta) => {
                let target_stat = stat_from_metadata(&target_meta);
                self.current_stat = target_stat;
                self.state = if target_stat.is_dir() {
                    WalkState::Dir
                } else {
                    WalkState::File
                };
                Ok(self.state)
            }
            Err(e) if is_dangling(&e) => {
                self.current_stat = link_stat;
                self.state = WalkState::Link;
                Ok(WalkState::Link)
            }
            Err(e) => Err(Error::from_io(self.path.as_str(), e)),
        }
    }
}

fn is_dangling(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(libc::ELOOP)
}
