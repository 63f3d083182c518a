#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! [`Panel`] is one pane's entire state: a working directory, its
//! scanned file records, a selection cursor, the hidden-file toggle,
//! and the sort order vector. Navigation (`enter`, `up`, `jump`,
//! `find`) and selection (`toggle_select`, `selected_to_list`) are
//! implemented here; rendering the panel is the (external) UI's job.
//!
//! # Invariants
//!
//! - The cursor is either an in-range visible index or the record list
//!   is empty.
//! - `num_selected` always equals the number of records whose
//!   `selected` flag is true.
//! - `num_hidden` always equals the number of records whose name starts
//!   with `.`.
//! - When `show_hidden` is false, no selected record is hidden.

use fmcore::{contains, Result};
use flist::{scan, sort_records, FileRecord, SortKey};
use path::AbsPath;
use strlist::StringList;
use tracing::instrument;

/// One pane of the dual-pane view.
#[derive(Debug, Clone)]
pub struct Panel {
    wd: AbsPath,
    records: Vec<FileRecord>,
    cursor: usize,
    num_selected: usize,
    num_hidden: usize,
    show_hidden: bool,
    ascending: bool,
    order: Vec<SortKey>,
}

impl Panel {
    /// A freshly constructed panel rooted at `wd`, not yet scanned.
    #[must_use]
    pub fn new(wd: AbsPath) -> Self {
        Panel {
            wd,
            records: Vec::new(),
            cursor: 0,
            num_selected: 0,
            num_hidden: 0,
            show_hidden: false,
            ascending: true,
            order: vec![SortKey::IsDir, SortKey::Name],
        }
    }

    /// The panel's working directory.
    #[must_use]
    pub fn wd(&self) -> &AbsPath {
        &self.wd
    }

    /// The current sorted file records.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// The cursor's current index into [`Panel::records`].
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Count of records whose `selected` flag is true.
    #[must_use]
    pub fn num_selected(&self) -> usize {
        self.num_selected
    }

    /// Count of records whose name starts with `.`.
    #[must_use]
    pub fn num_hidden(&self) -> usize {
        self.num_hidden
    }

    /// Whether hidden entries are currently shown.
    #[must_use]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    /// True iff `i` is in range and (hidden entries are shown, or the
    /// entry at `i` is not hidden).
    #[must_use]
    pub fn visible(&self, i: usize) -> bool {
        i < self.records.len() && (self.show_hidden || !self.records[i].is_hidden())
    }

    fn visible_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.records.len()).filter(move |&i| self.visible(i))
    }

    fn clamp_cursor_after_rescan(&mut self) {
        if self.records.is_empty() {
            self.cursor = 0;
            return;
        }
        let last_visible = self.visible_indices().last();
        let Some(last_visible) = last_visible else {
            return;
        };
        if self.cursor > last_visible {
            self.cursor = last_visible;
        }
        if !self.visible(self.cursor) {
            if let Some(next) = self.visible_indices().find(|&i| i >= self.cursor) {
                self.cursor = next;
            } else {
                self.cursor = last_visible;
            }
        }
    }

    /// Re-scan the working directory from disk, replacing the record
    /// list and resetting the selection (selection does not survive a
    /// rescan — the records it pointed at no longer exist).
    ///
    /// # Errors
    ///
    /// Propagates any error from opening or scanning the directory.
    #[instrument(skip(self), fields(wd = %self.wd))]
    pub fn rescan(&mut self) -> Result<()> {
        let result = scan(&self.wd, &self.order, self.ascending)?;
        self.records = result.records;
        self.num_hidden = result.hidden;
        self.num_selected = 0;
        self.clamp_cursor_after_rescan();
        Ok(())
    }

    /// Replace the order vector used by [`Panel::rescan`] and
    /// [`Panel::resort`].
    pub fn set_order(&mut self, order: Vec<SortKey>) {
        self.order = order;
    }

    /// Flip the ascending/descending flag.
    pub fn toggle_ascending(&mut self) {
        self.ascending = !self.ascending;
    }

    /// Re-sort the already-scanned records in place without touching
    /// the filesystem (for a sort-key change that shouldn't force a
    /// rescan).
    pub fn resort(&mut self) {
        sort_records(&mut self.records, &self.order, self.ascending);
    }

    /// Advance the cursor by `n` *visible* entries; negative moves
    /// backwards. Stops at the list boundaries. A no-op (cursor stays
    /// `0`) on an empty list.
    pub fn jump(&mut self, n: isize) {
        let vis: Vec<usize> = self.visible_indices().collect();
        if vis.is_empty() {
            self.cursor = 0;
            return;
        }
        let pos = vis.iter().position(|&i| i == self.cursor).unwrap_or(0) as isize;
        let new_pos = (pos + n).clamp(0, vis.len() as isize - 1);
        self.cursor = vis[new_pos as usize];
    }

    /// Move the cursor to the first visible entry.
    pub fn first(&mut self) {
        self.cursor = self.visible_indices().next().unwrap_or(0);
    }

    /// Move the cursor to the last visible entry.
    pub fn last(&mut self) {
        self.cursor = self.visible_indices().last().unwrap_or(0);
    }

    /// Descend into `name` (a child of the working directory) and
    /// rescan. On failure the working directory is restored.
    ///
    /// # Errors
    ///
    /// Propagates a path or scan error.
    pub fn enter(&mut self, name: &str) -> Result<()> {
        self.wd.push(name)?;
        if let Err(err) = self.rescan() {
            self.wd.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Move to the parent directory and rescan, positioning the cursor
    /// back on the directory just left (or the first entry, if it is
    /// gone).
    ///
    /// # Errors
    ///
    /// Propagates a scan error.
    pub fn up(&mut self) -> Result<()> {
        let leaf = self.wd.leaf().to_owned();
        self.wd.pop();
        self.rescan()?;
        if let Some(idx) = self.records.iter().position(|r| r.name == leaf) {
            if self.visible(idx) {
                self.cursor = idx;
                return Ok(());
            }
        }
        self.first();
        Ok(())
    }

    /// Flip [`Panel::show_hidden`]. When hiding, any selected hidden
    /// record is deselected and the cursor is moved off a now-hidden
    /// entry.
    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        if !self.show_hidden {
            for r in &mut self.records {
                if r.is_hidden() && r.selected {
                    r.selected = false;
                    self.num_selected -= 1;
                }
            }
            if !self.visible(self.cursor) {
                self.first();
            }
        }
    }

    /// Search visible entries in `[start, end]` (inclusive; search runs
    /// backwards when `start > end`) for the first name containing
    /// `needle` as a substring, placing the cursor there.
    ///
    /// Returns `true` on a hit, leaving the cursor unchanged on a miss.
    pub fn find(&mut self, needle: &str, start: usize, end: usize) -> bool {
        let step: isize = if start <= end { 1 } else { -1 };
        let mut i = start as isize;
        loop {
            if i < 0 || i as usize >= self.records.len() {
                break;
            }
            let idx = i as usize;
            if self.visible(idx) && contains(self.records[idx].name.as_bytes(), needle.as_bytes())
            {
                self.cursor = idx;
                return true;
            }
            if idx == end {
                break;
            }
            i += step;
        }
        false
    }

    /// Flip `selected` on the record under the cursor.
    pub fn toggle_select(&mut self) {
        if let Some(r) = self.records.get_mut(self.cursor) {
            r.selected = !r.selected;
            if r.selected {
                self.num_selected += 1;
            } else {
                self.num_selected -= 1;
            }
        }
    }

    /// Collect the names of selected records, in list order. If nothing
    /// is selected, the highlighted record is implicitly selected and
    /// returned as a singleton list; if the panel is empty, the list is
    /// empty.
    pub fn selected_to_list(&mut self) -> StringList {
        if self.num_selected == 0 {
            if let Some(r) = self.records.get_mut(self.cursor) {
                r.selected = true;
                self.num_selected = 1;
                let mut list = StringList::new();
                list.push(r.name.clone());
                return list;
            }
            return StringList::new();
        }
        self.records
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.name.clone())
            .collect()
    }
}
