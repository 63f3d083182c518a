#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! Validates an edited name list against an existing directory and
//! produces a [`RenamePlan`] — a trivial set of direct renames plus an
//! interdependent set requiring temporary-name cycle breaking — that
//! [`execute`] then applies.
//!
//! # Design
//!
//! Rather than index pairs into an auxiliary name pool (a C idiom for
//! avoiding redundant string copies), an [`Assignment`] just owns its
//! two `String`s directly — ownership makes the indirection
//! unnecessary.
//!
//! # Invariants
//!
//! - [`plan`] never mutates its `sources`/`renamed` lists unless it
//!   returns `Ok` — a rejected plan leaves the inputs exactly as given.
//! - Every `from` and every `to` across a returned plan's trivial and
//!   cycle assignments is distinct.

use std::collections::HashSet;

use fmcore::{Error, Result};
use path::AbsPath;
use strlist::StringList;
use tracing::instrument;

/// One planned rename: `from` the current name, `to` the target name,
/// both bare leaf names within the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// The entry's current name.
    pub from: String,
    /// The entry's target name.
    pub to: String,
}

/// A validated, executable rename schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    /// Direct renames whose target does not presently exist.
    pub trivial: Vec<Assignment>,
    /// Renames whose target collides with another entry being renamed
    /// in this same batch; resolved by [`execute`] via a temporary
    /// name.
    pub cycles: Vec<Assignment>,
}

impl RenamePlan {
    /// True iff the plan has nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trivial.is_empty() && self.cycles.is_empty()
    }
}

/// List the current entries of `wd` by bare name (no `.`/`..`).
///
/// # Errors
///
/// Propagates a failure to open `wd`.
pub fn list_existing(wd: &AbsPath) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(wd.as_str()).map_err(|e| Error::from_io(wd.as_str(), e))?;
    let mut names = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Validate `sources`/`renamed` against `wd` and build a [`RenamePlan`].
///
/// `sources[i]` is renamed to `renamed[i]`. On success, both lists have
/// their surviving slots nulled out (every pair either became part of
/// the plan or was eliminated as a no-op); on failure, both lists are
/// unchanged.
///
/// # Errors
///
/// - [`Error::InvalidName`] if any `renamed[i]` contains `/`.
/// - [`Error::Conflict`] if a `renamed[i]` names an existing entry that
///   is not itself one of `sources`, or if two assignments share a
///   `from` or a `to`.
#[instrument(skip(wd, sources, renamed), fields(wd = %wd))]
pub fn plan(wd: &AbsPath, sources: &mut StringList, renamed: &mut StringList) -> Result<RenamePlan> {
    let existing = list_existing(wd)?;
    plan_from_existing(&existing, sources, renamed)
}

/// The pure planning algorithm, parameterized over an already-listed
/// set of existing names. Split out from [`plan`] so the algorithm
/// itself is testable without touching the filesystem.
///
/// # Errors
///
/// See [`plan`].
pub fn plan_from_existing(
    existing: &[String],
    sources: &mut StringList,
    renamed: &mut StringList,
) -> Result<RenamePlan> {
    let mut trivial = Vec::new();
    let mut cycles = Vec::new();
    let mut to_clear = Vec::new();

    for i in 0..sources.len() {
        let (Some(s), Some(r)) = (sources.get(i), renamed.get(i)) else {
            continue;
        };

        if r.contains('/') {
            return Err(Error::InvalidName(r.to_owned()));
        }

        if s == r {
            to_clear.push(i);
            continue;
        }

        if existing.iter().any(|e| e == r) {
            if sources.lookup(r).is_some() {
                cycles.push(Assignment {
                    from: s.to_owned(),
                    to: r.to_owned(),
                });
                to_clear.push(i);
            } else {
                return Err(Error::Conflict(format!(
                    "{r} already exists and is not one of the entries being renamed"
                )));
            }
        } else {
            trivial.push(Assignment {
                from: s.to_owned(),
                to: r.to_owned(),
            });
            to_clear.push(i);
        }
    }

    let mut seen_from = HashSet::new();
    let mut seen_to = HashSet::new();
    for a in trivial.iter().chain(cycles.iter()) {
        if !seen_from.insert(a.from.as_str()) {
            return Err(Error::Conflict(format!("{} is renamed more than once", a.from)));
        }
        if !seen_to.insert(a.to.as_str()) {
            return Err(Error::Conflict(format!(
                "{} is the target of more than one rename",
                a.to
            )));
        }
    }

    for i in to_clear {
        sources.clear_slot(i);
        renamed.clear_slot(i);
    }

    Ok(RenamePlan { trivial, cycles })
}

fn rename_one(wd: &AbsPath, from: &str, to: &str) -> Result<()> {
    let mut from_path = wd.clone();
    from_path.push(from)?;
    let mut to_path = wd.clone();
    to_path.push(to)?;
    std::fs::rename(from_path.as_str(), to_path.as_str())
        .map_err(|e| Error::from_io(from_path.as_str(), e))
}

/// Apply a [`RenamePlan`] under `wd`: the trivial pass first (direct
/// renames, stopping at the first error), then — regardless of whether
/// the trivial pass failed — the interdependent pass (temporary-name
/// cycle breaking) — a failure in the trivial rename pass still falls
/// back to attempting the interdependent pass.
///
/// # Errors
///
/// Propagates the first `rename` failure seen in either pass, giving
/// priority to a trivial-pass failure. A trivial-pass failure may leave
/// earlier trivial renames already applied; the cycle pass is atomic
/// per connected component (a failure mid-cycle can leave one entry
/// under the temporary name).
#[instrument(skip(wd, plan), fields(wd = %wd, trivial = plan.trivial.len(), cycles = plan.cycles.len()))]
pub fn execute(wd: &AbsPath, plan: &RenamePlan) -> Result<()> {
    let mut trivial_err = None;
    for a in &plan.trivial {
        if let Err(e) = rename_one(wd, &a.from, &a.to) {
            trivial_err = Some(e);
            break;
        }
    }
    let cycle_result = execute_cycles(wd, &plan.cycles);
    match trivial_err {
        Some(e) => Err(e),
        None => cycle_result,
    }
}

fn find_by_to<'a>(cycles: &'a [Assignment], target: &str) -> Option<(usize, &'a Assignment)> {
    cycles.iter().enumerate().find(|(_, a)| a.to == target)
}

fn execute_cycles(wd: &AbsPath, cycles: &[Assignment]) -> Result<()> {
    let mut consumed = vec![false; cycles.len()];

    loop {
        let Some(anchor_idx) = consumed.iter().position(|c| !c) else {
            return Ok(());
        };
        let anchor = &cycles[anchor_idx];
        let temp = format!(".dpan.rename.tmp.{:x}", std::process::id());
        rename_one(wd, &anchor.from, &temp)?;
        consumed[anchor_idx] = true;

        let mut target = anchor.from.clone();
        loop {
            let Some((idx, found)) = find_by_to(cycles, &target) else {
                return Err(Error::Conflict(format!(
                    "rename cycle did not close after vacating {target:?}"
                )));
            };
            if idx == anchor_idx {
                rename_one(wd, &temp, &anchor.to)?;
                break;
            }
            rename_one(wd, &found.from, &found.to)?;
            target = found.from.clone();
            consumed[idx] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wd_in(dir: &std::path::Path) -> AbsPath {
        AbsPath::from_absolute(dir.to_str().unwrap()).unwrap()
    }

    #[test]
    fn invalid_name_rejects_and_leaves_inputs_unchanged() {
        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("a");
        renamed.push("b/c");
        let before_s = sources.clone();
        let before_r = renamed.clone();

        let err = plan_from_existing(&[], &mut sources, &mut renamed).unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
        assert_eq!(sources, before_s);
        assert_eq!(renamed, before_r);
    }

    #[test]
    fn no_op_pairs_are_nulled_without_a_rename() {
        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("same");
        renamed.push("same");

        let plan = plan_from_existing(&[], &mut sources, &mut renamed).unwrap();
        assert!(plan.is_empty());
        assert_eq!(sources.get(0), None);
        assert_eq!(renamed.get(0), None);
    }

    #[test]
    fn collision_with_non_source_entry_is_a_conflict() {
        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("a");
        renamed.push("taken");

        let err =
            plan_from_existing(&["taken".to_owned()], &mut sources, &mut renamed).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn two_cycle_plan_and_execute_swaps_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"A").unwrap();
        std::fs::write(dir.path().join("b"), b"B").unwrap();
        let wd = wd_in(dir.path());

        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("a");
        renamed.push("b");
        sources.push("b");
        renamed.push("a");

        let built = plan(&wd, &mut sources, &mut renamed).unwrap();
        assert_eq!(built.trivial.len(), 0);
        assert_eq!(built.cycles.len(), 2);

        execute(&wd, &built).unwrap();

        assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), b"B");
        assert_eq!(std::fs::read(dir.path().join("b")).unwrap(), b"A");
    }

    #[test]
    fn three_cycle_rotates_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"A").unwrap();
        std::fs::write(dir.path().join("b"), b"B").unwrap();
        std::fs::write(dir.path().join("c"), b"C").unwrap();
        let wd = wd_in(dir.path());

        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("a");
        renamed.push("b");
        sources.push("b");
        renamed.push("c");
        sources.push("c");
        renamed.push("a");

        let built = plan(&wd, &mut sources, &mut renamed).unwrap();
        execute(&wd, &built).unwrap();

        assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), b"C");
        assert_eq!(std::fs::read(dir.path().join("b")).unwrap(), b"A");
        assert_eq!(std::fs::read(dir.path().join("c")).unwrap(), b"B");
    }

    #[test]
    fn trivial_rename_has_no_cycle_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old"), b"x").unwrap();
        let wd = wd_in(dir.path());

        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("old");
        renamed.push("new");

        let built = plan(&wd, &mut sources, &mut renamed).unwrap();
        assert_eq!(built.trivial.len(), 1);
        assert!(built.cycles.is_empty());
        execute(&wd, &built).unwrap();
        assert!(dir.path().join("new").exists());
        assert!(!dir.path().join("old").exists());
    }

    #[test]
    fn duplicate_target_is_a_conflict() {
        let mut sources = StringList::new();
        let mut renamed = StringList::new();
        sources.push("a");
        renamed.push("x");
        sources.push("b");
        renamed.push("x");

        let err = plan_from_existing(&[], &mut sources, &mut renamed).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
