#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! [`Task`] is the budgeted, resumable copy/move/remove/chmod engine
//! it walks a set of source entries with a [`walk::TreeWalk`],
//! charges each unit of work against a caller-supplied budget, and
//! yields control the moment that budget is spent so a UI loop can
//! redraw and process input between calls.
//!
//! # Design
//!
//! Split across several files, each contributing one `impl Task`
//! block: [`engine`] holds construction, lifecycle transitions, and
//! the `Estimate` action; [`actions`] holds the `Copy`/`Remove`/`Chmod`
//! actions and the quick-move fast path. [`config`] is a fluent
//! builder for the budgets and chunk size; [`flags`] and [`kind`] are
//! the closed sets a task is parameterized by; [`chmod`] and
//! [`counters`] are small plain data types.

mod actions;
mod chmod;
mod config;
mod counters;
mod engine;
mod flags;
mod kind;

pub use chmod::ChmodParams;
pub use config::{TaskConfig, TaskConfigBuilder};
pub use counters::Counters;
pub use engine::{Task, TaskOutcome};
pub use flags::TaskFlags;
pub use kind::{TaskKind, TaskPhase};

#[cfg(test)]
mod tests {
    use super::*;
    use path::AbsPath;
    use strlist::StringList;

    fn root_at(p: &std::path::Path) -> AbsPath {
        AbsPath::from_absolute(p.to_str().unwrap()).unwrap()
    }

    fn run_to_confirm(task: &mut Task) {
        loop {
            match task.do_step(4096) {
                TaskOutcome::PhaseComplete => break,
                TaskOutcome::BudgetExhausted => continue,
                other => panic!("unexpected outcome during estimate: {other:?}"),
            }
        }
        assert_eq!(task.phase(), TaskPhase::Confirm);
    }

    fn run_to_finish(task: &mut Task) {
        loop {
            match task.do_step(4096) {
                TaskOutcome::PhaseComplete => break,
                TaskOutcome::BudgetExhausted => continue,
                other => panic!("unexpected outcome during action phase: {other:?}"),
            }
        }
        assert_eq!(task.phase(), TaskPhase::Finished);
    }

    #[test]
    fn copy_single_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("a.txt"), b"hello world").unwrap();

        let mut sources = StringList::new();
        sources.push("a.txt");
        let renamed = sources.clone();

        let mut task = Task::new(
            TaskKind::Copy,
            TaskFlags::none(),
            root_at(src_dir.path()),
            root_at(dst_dir.path()),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        assert_eq!(task.counters().files_total, 1);
        assert_eq!(task.counters().bytes_total, 11);

        task.confirm();
        run_to_finish(&mut task);

        assert_eq!(
            std::fs::read(dst_dir.path().join("a.txt")).unwrap(),
            b"hello world"
        );
        assert!(src_dir.path().join("a.txt").exists());
        assert_eq!(task.counters().files_done, 1);
        assert!(task.counters().is_monotonic());
    }

    #[test]
    fn recursive_remove_counts_dirs_and_files() {
        let src_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src_dir.path().join("src/a/b")).unwrap();
        std::fs::write(src_dir.path().join("src/a/b/c.txt"), b"x").unwrap();

        let mut sources = StringList::new();
        sources.push("src");
        let renamed = sources.clone();

        let mut task = Task::new(
            TaskKind::Remove,
            TaskFlags::none(),
            root_at(src_dir.path()),
            AbsPath::root(),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        task.confirm();
        run_to_finish(&mut task);

        assert_eq!(task.counters().files_done, 1);
        assert_eq!(task.counters().dirs_done, 3);
        assert!(!src_dir.path().join("src").exists());
    }

    #[test]
    fn quick_move_uses_single_rename_on_same_device() {
        let root = tempfile::tempdir().unwrap();
        let src_dir = root.path().join("src");
        let dst_dir = root.path().join("dst");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::create_dir_all(&dst_dir).unwrap();
        std::fs::write(src_dir.join("f.txt"), b"data").unwrap();

        let mut sources = StringList::new();
        sources.push("f.txt");
        let renamed = sources.clone();

        let mut task = Task::new(
            TaskKind::Move,
            TaskFlags::none(),
            root_at(&src_dir),
            root_at(&dst_dir),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        task.confirm();
        run_to_finish(&mut task);

        assert!(!src_dir.join("f.txt").exists());
        assert_eq!(std::fs::read(dst_dir.join("f.txt")).unwrap(), b"data");
        assert_eq!(task.counters().bytes_done, task.counters().bytes_total);
    }

    #[test]
    fn copy_with_existing_destination_asks_by_default() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("a.txt"), b"new").unwrap();
        std::fs::write(dst_dir.path().join("a.txt"), b"old").unwrap();

        let mut sources = StringList::new();
        sources.push("a.txt");
        let renamed = sources.clone();

        let mut task = Task::new(
            TaskKind::Copy,
            TaskFlags::none(),
            root_at(src_dir.path()),
            root_at(dst_dir.path()),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        assert_eq!(task.counters().conflicts, 1);

        task.confirm();
        let outcome = task.do_step(4096);
        assert_eq!(outcome, TaskOutcome::Failed);
        assert!(task.last_error().is_some());

        task.resolve_next_conflict_by_overwriting();
        run_to_finish(&mut task);
        assert_eq!(std::fs::read(dst_dir.path().join("a.txt")).unwrap(), b"new");
    }

    #[test]
    fn copy_with_skip_conflicts_leaves_destination_untouched() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::write(src_dir.path().join("a.txt"), b"new").unwrap();
        std::fs::write(dst_dir.path().join("a.txt"), b"old").unwrap();

        let mut sources = StringList::new();
        sources.push("a.txt");
        let renamed = sources.clone();

        let mut flags = TaskFlags::none();
        flags.skip_conflicts = true;

        let mut task = Task::new(
            TaskKind::Copy,
            flags,
            root_at(src_dir.path()),
            root_at(dst_dir.path()),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        task.confirm();
        run_to_finish(&mut task);

        assert_eq!(std::fs::read(dst_dir.path().join("a.txt")).unwrap(), b"old");
    }

    #[test]
    fn chmod_non_recursive_touches_only_top_level() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("d")).unwrap();
        std::fs::write(dir.path().join("d/f.txt"), b"x").unwrap();

        let mut sources = StringList::new();
        sources.push("d");
        let renamed = sources.clone();

        let chmod = ChmodParams {
            plus_mask: 0o111,
            minus_mask: 0,
            uid: None,
            gid: None,
        };

        let mut task = Task::new(
            TaskKind::Chmod,
            TaskFlags::none(),
            root_at(dir.path()),
            AbsPath::root(),
            sources,
            renamed,
            chmod,
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        task.confirm();
        run_to_finish(&mut task);

        use std::os::unix::fs::PermissionsExt;
        let d_mode = std::fs::metadata(dir.path().join("d")).unwrap().permissions().mode();
        assert_ne!(d_mode & 0o111, 0);
    }

    #[test]
    fn relative_link_into_copied_subtree_stays_verbatim() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src_dir.path().join("d/sub")).unwrap();
        std::fs::write(src_dir.path().join("d/sub/target"), b"x").unwrap();
        std::os::unix::fs::symlink("sub/target", src_dir.path().join("d/link")).unwrap();

        let mut sources = StringList::new();
        sources.push("d");
        let renamed = sources.clone();

        let mut flags = TaskFlags::none();
        flags.recalculate_links = true;

        let mut task = Task::new(
            TaskKind::Copy,
            flags,
            root_at(src_dir.path()),
            root_at(dst_dir.path()),
            sources,
            renamed,
            ChmodParams::default(),
            TaskConfig::builder().build().unwrap(),
        );

        run_to_confirm(&mut task);
        task.confirm();
        run_to_finish(&mut task);

        let copied_link = dst_dir.path().join("d/link");
        assert_eq!(std::fs::read_link(&copied_link).unwrap().to_str().unwrap(), "sub/target");
        assert_eq!(std::fs::read(&copied_link).unwrap(), b"x");
    }
}
