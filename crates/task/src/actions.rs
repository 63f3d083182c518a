//! The `Copy`/`Remove`/`Chmod` actions, split out of [`crate::engine`]
//! into their own `impl Task` block so each action's stepping logic
//! reads as a self-contained unit.

use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;

use fmcore::{contains, Error, Result};
use path::AbsPath;
use rustix::fs::{Gid, Mode, Uid};
use walk::WalkState;

use crate::engine::{ConflictOutcome, Task, TaskOutcome};

/// Outcome of driving a single in-progress regular-file copy.
enum CopyProgress {
    /// The file finished copying; carries the bytes moved this call.
    Done(u64),
    /// The call's budget ran out mid-file; carries the bytes moved.
    BudgetExhausted(u64),
}

impl Task {
    pub(crate) fn run_copy_remove(&mut self, budget: u64) -> TaskOutcome {
        if self.kind == crate::kind::TaskKind::Move && self.same_device() {
            return self.run_quick_move(budget);
        }
        self.run_walked_copy_remove(budget)
    }

    /// The quick-move precondition: `src_root` and `dst_root` share a
    /// device, so each source can be relocated with a single `rename`
    /// instead of a recursive copy-then-remove.
    fn run_quick_move(&mut self, budget: u64) -> TaskOutcome {
        let mut spent = 0u64;
        loop {
            if spent >= budget {
                return TaskOutcome::BudgetExhausted;
            }
            if self.current_index >= self.sources.len() {
                self.counters.bytes_done = self.counters.bytes_total;
                self.counters.files_done = self.counters.files_total;
                self.counters.dirs_done = self.counters.dirs_total;
                self.phase = crate::kind::TaskPhase::Finished;
                return TaskOutcome::PhaseComplete;
            }
            let Some(name) = self.sources.get(self.current_index) else {
                self.current_index += 1;
                continue;
            };
            let mut from = self.src_root.clone();
            if let Err(e) = from.push(name) {
                return self.fail(e);
            }
            let (_, renamed_leaf) = self.current_rename_pair();
            let mut to = self.dst_root.clone();
            if let Err(e) = to.push(&renamed_leaf) {
                return self.fail(e);
            }
            match std::fs::rename(from.as_str(), to.as_str()) {
                Ok(()) => {
                    self.current_index += 1;
                    spent += 1;
                }
                Err(e) => return self.fail(Error::from_io(from.as_str(), e)),
            }
        }
    }

    pub(crate) fn same_device(&mut self) -> bool {
        if let Some(v) = self.same_device {
            return v;
        }
        let v = match (
            rustix::fs::stat(self.src_root.as_str()),
            rustix::fs::stat(self.dst_root.as_str()),
        ) {
            (Ok(a), Ok(b)) => a.st_dev == b.st_dev,
            _ => false,
        };
        self.same_device = Some(v);
        v
    }

    fn run_walked_copy_remove(&mut self, budget: u64) -> TaskOutcome {
        let mut spent = 0u64;
        loop {
            if self.in_file.is_some() {
                match self.continue_file_copy(budget.saturating_sub(spent)) {
                    Ok(CopyProgress::Done(n)) => {
                        spent += n;
                        if let Err(e) = self.finish_file_copy() {
                            return self.fail(e);
                        }
                        self.pending_event = None;
                    }
                    Ok(CopyProgress::BudgetExhausted(n)) => {
                        spent += n;
                        return TaskOutcome::BudgetExhausted;
                    }
                    Err(e) => return self.fail(e),
                }
                continue;
            }

            if spent >= budget {
                return TaskOutcome::BudgetExhausted;
            }

            match self.ensure_walker() {
                Ok(false) => {
                    self.phase = crate::kind::TaskPhase::Finished;
                    return TaskOutcome::PhaseComplete;
                }
                Err(e) => return self.fail(e),
                Ok(true) => {}
            }

            let event = match self.next_event() {
                Ok(ev) => ev,
                Err(e) => return self.fail(e),
            };

            match event {
                WalkState::Exit => {
                    spent += 1;
                    self.current_index += 1;
                    self.walker = None;
                }
                WalkState::DirEnd => {
                    spent += 1;
                    if self.kind.removes_source() {
                        if let Err(e) = self.rmdir_source_current() {
                            self.pending_event = Some(event);
                            return self.fail(e);
                        }
                    }
                    self.counters.dirs_done += 1;
                }
                WalkState::Special => {
                    spent += 1;
                }
                WalkState::Link => {
                    spent += 1;
                    if self.flags.skip_links {
                        continue;
                    }
                    match self.step_link() {
                        Ok(()) => {}
                        Err(e) => {
                            self.pending_event = Some(event);
                            return self.fail(e);
                        }
                    }
                }
                WalkState::Dir => {
                    spent += 1;
                    match self.step_dir() {
                        Ok(()) => {}
                        Err(e) => {
                            self.pending_event = Some(event);
                            return self.fail(e);
                        }
                    }
                }
                WalkState::File => {
                    match self.step_file_start() {
                        Ok(skipped) => {
                            spent += 1;
                            if skipped {
                                continue;
                            }
                        }
                        Err(e) => {
                            self.pending_event = Some(event);
                            return self.fail(e);
                        }
                    }
                }
            }
        }
    }

    fn resolve_conflict(&mut self, target: &AbsPath) -> Result<ConflictOutcome> {
        if std::fs::symlink_metadata(target.as_str()).is_err() {
            return Ok(ConflictOutcome::Proceed);
        }
        if self.flags.skip_conflicts {
            return Ok(ConflictOutcome::Skip);
        }
        if self.flags.overwrite_conflicts {
            remove_any(target)?;
            return Ok(ConflictOutcome::Proceed);
        }
        if self.flags.overwrite_once {
            self.flags.overwrite_once = false;
            remove_any(target)?;
            return Ok(ConflictOutcome::Proceed);
        }
        Err(Error::AlreadyExists(target.as_str().into()))
    }

    /// Directory conflicts tolerate merging into an existing destination
    /// directory unless `ask-conflicts` is set: unlike a file, "the
    /// destination already has an entry with this name" is the normal
    /// case for a recursive copy into a populated tree.
    fn resolve_dir_conflict(&mut self, target: &AbsPath) -> Result<ConflictOutcome> {
        if std::fs::symlink_metadata(target.as_str()).is_err() {
            return Ok(ConflictOutcome::Proceed);
        }
        if self.flags.ask_conflicts {
            return Err(Error::AlreadyExists(target.as_str().into()));
        }
        Ok(ConflictOutcome::Skip)
    }

    fn step_dir(&mut self) -> Result<()> {
        if !self.kind.copies() {
            return Ok(());
        }
        let target = self.build_target_path()?;
        if let ConflictOutcome::Proceed = self.resolve_dir_conflict(&target)? {
            let mode = self.walker.as_ref().expect("active during a walked step").current_stat().permission_bits();
            match rustix::fs::mkdir(target.as_str(), Mode::from_raw_mode(mode)) {
                Ok(()) => {}
                Err(e) if e == rustix::io::Errno::EXIST => {}
                Err(e) => return Err(Error::from_io(target.as_str(), std::io::Error::from(e))),
            }
        }
        Ok(())
    }

    fn step_link(&mut self) -> Result<()> {
        if self.kind.copies() {
            self.copy_link()?;
        }
        if self.kind.removes_source() {
            let path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
            std::fs::remove_file(&path).map_err(|e| Error::from_io(path, e))?;
        }
        self.counters.files_done += 1;
        Ok(())
    }

    fn copy_link(&mut self) -> Result<()> {
        let target = self.build_target_path()?;
        if let ConflictOutcome::Skip = self.resolve_conflict(&target)? {
            return Ok(());
        }
        let src_path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
        let link_target = std::fs::read_link(&src_path).map_err(|e| Error::from_io(src_path.clone(), e))?;
        let link_target = link_target.to_string_lossy().into_owned();

        let final_target = if self.flags.raw_links || link_target.starts_with('/') {
            link_target
        } else {
            let mut src_parent = AbsPath::from_absolute(src_path)?;
            src_parent.pop();
            let mut abs_target = src_parent;
            abs_target.cd(&link_target)?;

            // A relative target that resolves inside the root being
            // copied stays verbatim: the copy mirrors the subtree's
            // own relative layout, so the same text still resolves
            // once both the link and its target have been copied.
            // Recomputing it against the link's new absolute location
            // would instead point back into the (possibly now-removed)
            // source tree.
            if contains(abs_target.as_str().as_bytes(), self.src_root.as_str().as_bytes()) {
                link_target
            } else {
                let mut dst_parent = target.clone();
                dst_parent.pop();
                relativize(dst_parent.as_str(), abs_target.as_str())
            }
        };

        std::os::unix::fs::symlink(&final_target, target.as_str())
            .map_err(|e| Error::from_io(target.as_str(), e))
    }

    fn step_file_start(&mut self) -> Result<bool> {
        if !self.kind.copies() {
            let path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
            std::fs::remove_file(&path).map_err(|e| Error::from_io(path, e))?;
            self.counters.files_done += 1;
            return Ok(false);
        }

        let target = self.build_target_path()?;
        if let ConflictOutcome::Skip = self.resolve_conflict(&target)? {
            return Ok(true);
        }

        let src_path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
        let mode = self.walker.as_ref().expect("active during a walked step").current_stat().permission_bits();
        let size = self.walker.as_ref().expect("active during a walked step").current_stat().size;

        let inf = std::fs::File::open(&src_path).map_err(|e| Error::from_io(src_path, e))?;
        let outf = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(target.as_str())
            .map_err(|e| Error::from_io(target.as_str(), e))?;
        let _ = outf.set_permissions(std::fs::Permissions::from_mode(mode));
        if size > 0 {
            let _ = rustix::fs::fallocate(&outf, rustix::fs::FallocateFlags::empty(), 0, size);
        }

        self.in_file = Some(inf);
        self.out_file = Some(outf);
        Ok(false)
    }

    fn continue_file_copy(&mut self, budget: u64) -> Result<CopyProgress> {
        let chunk = self.config.copy_chunk_size();
        let mut buf = vec![0u8; chunk];
        let mut spent = 0u64;
        loop {
            if spent >= budget.max(chunk as u64) && spent > 0 {
                return Ok(CopyProgress::BudgetExhausted(spent));
            }
            let n = {
                let inf = self.in_file.as_mut().expect("in_file set by step_file_start");
                inf.read(&mut buf).map_err(|e| Error::from_io("<copy>", e))?
            };
            if n == 0 {
                return Ok(CopyProgress::Done(spent));
            }
            {
                let outf = self.out_file.as_mut().expect("out_file set by step_file_start");
                outf.write_all(&buf[..n]).map_err(|e| Error::from_io("<copy>", e))?;
            }
            self.counters.bytes_done += n as u64;
            spent += n as u64;
        }
    }

    fn finish_file_copy(&mut self) -> Result<()> {
        self.in_file = None;
        self.out_file = None;
        self.counters.files_done += 1;
        if self.kind.removes_source() {
            let path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
            std::fs::remove_file(&path).map_err(|e| Error::from_io(path, e))?;
        }
        Ok(())
    }

    fn rmdir_source_current(&mut self) -> Result<()> {
        let path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
        std::fs::remove_dir(&path).map_err(|e| Error::from_io(path, e))
    }

    pub(crate) fn run_chmod(&mut self, budget: u64) -> TaskOutcome {
        let mut spent = 0u64;
        loop {
            if spent >= budget {
                return TaskOutcome::BudgetExhausted;
            }
            match self.ensure_walker() {
                Ok(false) => {
                    self.phase = crate::kind::TaskPhase::Finished;
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
                WalkState::DirEnd | WalkState::Special => {}
                WalkState::File | WalkState::Link | WalkState::Dir => {
                    if let Err(e) = self.apply_chmod_current() {
                        self.pending_event = Some(event);
                        return self.fail(e);
                    }
                    if !self.flags.recursive_chmod {
                        self.walker = None;
                        self.current_index += 1;
                    }
                }
            }
        }
    }

    fn apply_chmod_current(&mut self) -> Result<()> {
        if self.chmod.is_noop() {
            return Ok(());
        }
        let path = self.walker.as_ref().expect("active during a walked step").path().as_str().to_owned();
        let stat = *self.walker.as_ref().expect("active during a walked step").current_stat();

        if self.chmod.plus_mask != 0 || self.chmod.minus_mask != 0 {
            let new_mode = self.chmod.apply_mask(stat.permission_bits());
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(new_mode))
                .map_err(|e| Error::from_io(path.clone(), e))?;
        }
        if self.chmod.uid.is_some() || self.chmod.gid.is_some() {
            let uid = self.chmod.uid.map(Uid::from_raw);
            let gid = self.chmod.gid.map(Gid::from_raw);
            rustix::fs::chown(&path, uid, gid)
                .map_err(|e| Error::from_io(path, std::io::Error::from(e)))?;
        }
        Ok(())
    }
}

fn remove_any(target: &AbsPath) -> Result<()> {
    match std::fs::symlink_metadata(target.as_str()) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(target.as_str()),
        Ok(_) => std::fs::remove_file(target.as_str()),
        Err(_) => return Ok(()),
    }
    .map_err(|e| Error::from_io(target.as_str(), e))
}

/// Compute a relative path from `base_dir` to `target`, so a relocated
/// relative symlink still resolves to the same entity.
fn relativize(base_dir: &str, target: &str) -> String {
    let base: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    let tgt: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let common = base.iter().zip(tgt.iter()).take_while(|(a, b)| a == b).count();
    let ups = base.len() - common;
    let mut segs: Vec<&str> = Vec::with_capacity(ups + tgt.len() - common);
    segs.extend(std::iter::repeat("..").take(ups));
    segs.extend_from_slice(&tgt[common..]);
    if segs.is_empty() {
        ".".to_owned()
    } else {
        segs.join("/")
    }
}
