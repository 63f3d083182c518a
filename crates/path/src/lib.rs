#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! A bounded, mutable, always-absolute path buffer shared by the
//! scanner, walker, and task crates. Every mutation either succeeds and
//! leaves the buffer in a normalized state, or fails with
//! [`fmcore::Error::NameTooLong`] and leaves the buffer exactly as it
//! was — callers never have to guard against a half-mutated path.
//!
//! # Invariants
//!
//! - Always absolute (starts with `/`).
//! - No duplicate `/`, no trailing `/` unless the whole path is `/`.
//! - No `.`/`..` segments survive a [`AbsPath::cd`] call.
//! - Never longer than [`fmcore::PATH_MAX`] bytes.

use fmcore::{Error, Result, PATH_MAX};

/// An absolute path, bounded to [`fmcore::PATH_MAX`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsPath {
    buf: String,
}

impl AbsPath {
    /// The root path `/`.
    #[must_use]
    pub fn root() -> Self {
        AbsPath { buf: String::from("/") }
    }

    /// Wrap an already-absolute, already-normalized string. Intended for
    /// paths obtained from the environment (e.g. a working directory
    /// read at startup), not for user-typed input — use [`AbsPath::cd`]
    /// for that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] if `s` exceeds [`fmcore::PATH_MAX`].
    pub fn from_absolute(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.len() > PATH_MAX {
            return Err(Error::NameTooLong(s.into()));
        }
        Ok(AbsPath { buf: s })
    }

    /// Borrow the path as a `&str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Byte length of the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True iff the path is empty. Never true for a well-formed
    /// [`AbsPath`]; provided to satisfy clippy's `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append `/name` (or just `name`, when the buffer is `/`) in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] and leaves `self` unchanged if the
    /// result would exceed [`fmcore::PATH_MAX`].
    pub fn push(&mut self, name: &str) -> Result<()> {
        push_into(&mut self.buf, name)
    }

    /// Remove the last segment and its leading `/`. A no-op at root.
    pub fn pop(&mut self) {
        pop_into(&mut self.buf);
    }

    /// Byte offset of the last path segment's first byte (the offset at
    /// which the "current directory" name starts). At root this points
    /// just past the trailing `/`, i.e. to an empty name.
    #[must_use]
    pub fn current_dir_offset(&self) -> usize {
        self.buf.rfind('/').map_or(0, |i| i + 1)
    }

    /// The last path segment, e.g. `"c"` for `/a/b/c`, or `""` at root.
    #[must_use]
    pub fn leaf(&self) -> &str {
        &self.buf[self.current_dir_offset()..]
    }

    /// Reinterpret `dest` relative to `self`, producing a normalized
    /// absolute path in place.
    ///
    /// - A `dest` beginning with `/` restarts from an empty buffer.
    /// - A `dest` beginning with `~` substitutes the caller's home
    ///   directory (environment `HOME`, falling back to the password
    ///   database entry for the effective uid).
    /// - Each `/`-separated segment of the remainder is applied in
    ///   order: `.` is skipped, `..` pops, anything else pushes.
    /// - An empty result is forced to `/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameTooLong`] and leaves `self` unchanged if any
    /// intermediate push would overflow [`fmcore::PATH_MAX`].
    pub fn cd(&mut self, dest: &str) -> Result<()> {
        let (mut work, rest) = if let Some(stripped) = dest.strip_prefix('/') {
            (String::new(), stripped)
        } else if dest == "~" || dest.starts_with("~/") {
            let home = home_dir()?;
            let rest = dest.strip_prefix('~').unwrap_or(dest);
            (home, rest.strip_prefix('/').unwrap_or(rest))
        } else {
            (self.buf.clone(), dest)
        };

        for seg in rest.split('/').filter(|s| !s.is_empty()) {
            match seg {
                "." => {}
                ".." => pop_into(&mut work),
                other => push_into(&mut work, other)?,
            }
        }
        if work.is_empty() {
            work.push('/');
        }
        self.buf = work;
        Ok(())
    }
}

impl std::fmt::Display for AbsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.buf)
    }
}

fn push_into(buf: &mut String, name: &str) -> Result<()> {
    if name.is_empty() {
        return Ok(());
    }
    let at_root = buf.is_empty() || buf == "/";
    let new_len = if at_root { 1 + name.len() } else { buf.len() + 1 + name.len() };
    if new_len > PATH_MAX {
        return Err(Error::NameTooLong(format!("{buf}/{name}").into()));
    }
    if at_root {
        buf.clear();
        buf.push('/');
        buf.push_str(name);
    } else {
        buf.push('/');
        buf.push_str(name);
    }
    Ok(())
}

fn pop_into(buf: &mut String) {
    if buf.is_empty() || buf == "/" {
        return;
    }
    match buf.rfind('/') {
        Some(0) => buf.truncate(1),
        Some(idx) => buf.truncate(idx),
        None => {}
    }
}

/// Translate a source-side path `p` (as produced by walking `src`) into
/// a destination-side path.
///
/// `p` must have `src` as a prefix. When `source_leaf`/`renamed_leaf`
/// are given, the top-level entry is additionally renamed: the result
/// is `dst / renamed_leaf / (remainder of p after src/source_leaf)`.
/// Without a rename, the result simply replaces the `src` prefix of `p`
/// with `dst`.
///
/// # Errors
///
/// Returns [`Error::NameTooLong`] if the composed result would exceed
/// [`fmcore::PATH_MAX`].
pub fn build_path(
    p: &AbsPath,
    src: &AbsPath,
    dst: &AbsPath,
    rename: Option<(&str, &str)>,
) -> Result<AbsPath> {
    let mut out = dst.clone();

    if let Some((source_leaf, renamed_leaf)) = rename {
        out.push(renamed_leaf)?;
        let mut prefix = src.clone();
        prefix.push(source_leaf)?;
        let remainder = p.as_str().strip_prefix(prefix.as_str()).unwrap_or("");
        for seg in remainder.split('/').filter(|s| !s.is_empty()) {
            out.push(seg)?;
        }
    } else {
        let remainder = p.as_str().strip_prefix(src.as_str()).unwrap_or("");
        for seg in remainder.split('/').filter(|s| !s.is_empty()) {
            out.push(seg)?;
        }
    }

    Ok(out)
}

/// The effective user's home directory: `$HOME` if set, else the
/// password-database entry for the effective uid.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if neither source yields a directory.
#[cfg(unix)]
pub fn home_dir() -> Result<String> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(home);
        }
    }
    let uid = nix::unistd::Uid::current();
    match nix::unistd::User::from_uid(uid) {
        Ok(Some(user)) => user
            .dir
            .into_os_string()
            .into_string()
            .map_err(|_| Error::NotFound("$HOME".into())),
        _ => Err(Error::NotFound("$HOME".into())),
    }
}

#[cfg(not(unix))]
#[allow(missing_docs)]
pub fn home_dir() -> Result<String> {
    std::env::var("HOME").map_err(|_| Error::NotFound("$HOME".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_symmetry() {
        let mut p = AbsPath::root();
        p.push("a").unwrap();
        p.push("b").unwrap();
        assert_eq!(p.as_str(), "/a/b");
        p.pop();
        assert_eq!(p.as_str(), "/a");
        p.pop();
        assert_eq!(p.as_str(), "/");
        p.pop();
        assert_eq!(p.as_str(), "/");
    }

    #[test]
    fn push_bound_leaves_unchanged() {
        let mut p = AbsPath::root();
        let long_name = "x".repeat(PATH_MAX);
        let before = p.clone();
        let err = p.push(&long_name).unwrap_err();
        assert!(matches!(err, Error::NameTooLong(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn cd_normalization_scenario() {
        let mut p = AbsPath::root();
        p.cd("//d//e//f").unwrap();
        assert_eq!(p.as_str(), "/d/e/f");
        p.cd("lol/../wat").unwrap();
        assert_eq!(p.as_str(), "/d/e/f/wat");
        p.cd("/////").unwrap();
        assert_eq!(p.as_str(), "/");
    }

    #[test]
    fn cd_is_idempotent_on_noop() {
        let mut p = AbsPath::root();
        p.cd("/d/e/f").unwrap();
        let mut same = p.clone();
        same.cd(".").unwrap();
        assert_eq!(p, same);
    }

    #[test]
    fn cd_root_has_no_dots_or_double_slash() {
        let mut p = AbsPath::root();
        p.cd("a/./b/../c").unwrap();
        assert_eq!(p.as_str(), "/a/c");
        assert!(!p.as_str().contains(".."));
        assert!(!p.as_str().contains("//"));
    }

    #[test]
    fn current_dir_offset_and_leaf() {
        let mut p = AbsPath::root();
        p.cd("/a/b/c").unwrap();
        assert_eq!(p.leaf(), "c");
        assert_eq!(&p.as_str()[p.current_dir_offset()..], "c");
    }

    #[test]
    fn build_path_with_rename() {
        let p = AbsPath::from_absolute("/home/user/doc/dir/file.txt").unwrap();
        let src = AbsPath::from_absolute("/home/user/doc").unwrap();
        let dst = AbsPath::from_absolute("/home/user/.trash").unwrap();
        let out = build_path(&p, &src, &dst, Some(("dir", "repl"))).unwrap();
        assert_eq!(out.as_str(), "/home/user/.trash/repl/file.txt");
    }

    #[test]
    fn build_path_without_rename_replaces_prefix() {
        let p = AbsPath::from_absolute("/home/user/doc/dir/file.txt").unwrap();
        let src = AbsPath::from_absolute("/home/user/doc").unwrap();
        let dst = AbsPath::from_absolute("/home/user/.trash").unwrap();
        let out = build_path(&p, &src, &dst, None).unwrap();
        assert_eq!(out.as_str(), "/home/user/.trash/dir/file.txt");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_]{1,12}"
    }

    proptest! {
        #[test]
        fn push_pop_symmetry(segs in prop::collection::vec(segment(), 0..6), name in segment()) {
            let mut p = AbsPath::root();
            for s in &segs {
                p.push(s).unwrap();
            }
            let before = p.clone();
            if p.push(&name).is_ok() {
                p.pop();
                prop_assert_eq!(p, before);
            }
        }

        #[test]
        fn push_bound_is_exact_and_non_destructive(
            segs in prop::collection::vec(segment(), 0..6),
            pad_len in 0usize..PATH_MAX + 64,
        ) {
            let mut p = AbsPath::root();
            for s in &segs {
                p.push(s).unwrap();
            }
            let name = "x".repeat(pad_len.max(1));
            let before = p.clone();
            let at_root = before.as_str() == "/";
            let would_be_len = if at_root { 1 + name.len() } else { before.len() + 1 + name.len() };
            match p.push(&name) {
                Ok(()) => prop_assert!(would_be_len <= PATH_MAX),
                Err(Error::NameTooLong(_)) => {
                    prop_assert!(would_be_len > PATH_MAX);
                    prop_assert_eq!(&p, &before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }

        #[test]
        fn cd_result_is_always_normalized(
            segs in prop::collection::vec(prop_oneof![segment(), Just(".".to_string()), Just("..".to_string())], 0..8),
        ) {
            let mut p = AbsPath::root();
            let dest = segs.join("/");
            if p.cd(&dest).is_ok() {
                prop_assert!(p.as_str().starts_with('/'));
                prop_assert!(!p.as_str().contains("//"));
                prop_assert!(p.as_str().split('/').all(|s| s != "." && s != ".."));
            }
        }

        #[test]
        fn cd_then_cd_dot_is_idempotent(
            segs in prop::collection::vec(segment(), 0..6),
        ) {
            let mut p = AbsPath::root();
            let dest = segs.join("/");
            if p.cd(&dest).is_ok() {
                let mut again = p.clone();
                if again.cd(".").is_ok() {
                    prop_assert_eq!(p, again);
                }
            }
        }
    }
}
