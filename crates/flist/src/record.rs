/// Stat metadata captured for a single directory entry.
///
/// A zeroed [`Stat`] (all fields `0`) marks an entry whose `lstat` call
/// failed; the scanner absorbs that failure rather than dropping the
/// entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    /// `st_mode`, including the file-type bits.
    pub mode: u32,
    /// `st_size` in bytes.
    pub size: u64,
    /// `st_uid`.
    pub uid: u32,
    /// `st_gid`.
    pub gid: u32,
    /// `st_mtime`, seconds since the epoch.
    pub mtime: i64,
    /// `st_atime`, seconds since the epoch.
    pub atime: i64,
    /// `st_ctime`, seconds since the epoch.
    pub ctime: i64,
    /// `st_ino`.
    pub ino: u64,
}

impl Stat {
    const S_IFMT: u32 = 0o170_000;
    const S_IFDIR: u32 = 0o040_000;
    const S_IFLNK: u32 = 0o120_000;
    const S_IFREG: u32 = 0o100_000;
    const EXEC_BITS: u32 = 0o111;

    /// True iff the mode bits mark a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mode & Self::S_IFMT == Self::S_IFDIR
    }

    /// True iff the mode bits mark a symlink.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.mode & Self::S_IFMT == Self::S_IFLNK
    }

    /// True iff the mode bits mark a regular file.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.mode & Self::S_IFMT == Self::S_IFREG
    }

    /// True iff this is a regular file with any executable bit set.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.is_regular() && self.mode & Self::EXEC_BITS != 0
    }

    /// The low 12 permission bits of the mode (the part `chmod` edits).
    #[must_use]
    pub fn permission_bits(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// One materialized directory entry: name plus metadata plus the
/// panel-local `selected` flag.
///
/// `.` and `..` are never materialized as records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// The entry's bare name (bounded to `NAME_MAX` by construction).
    pub name: String,
    /// `lstat` metadata, or a zeroed [`Stat`] if `lstat` failed.
    pub stat: Stat,
    /// Whether this entry is part of the panel's current selection.
    pub selected: bool,
}

impl FileRecord {
    /// True iff the name starts with `.` (a "hidden" entry by the
    /// panel's visibility policy).
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Convert a [`std::fs::Metadata`] (from `lstat`/`stat`) into a [`Stat`].
///
/// Shared by the scanner and the tree walker so both read the same
/// mode/size/owner/timestamp fields the same way.
#[cfg(unix)]
#[must_use]
pub fn stat_from_metadata(meta: &std::fs::Metadata) -> Stat {
    use std::os::unix::fs::MetadataExt;
    Stat {
        mode: meta.mode(),
        size: meta.size(),
        uid: meta.uid(),
        gid: meta.gid(),
        mtime: meta.mtime(),
        atime: meta.atime(),
        ctime: meta.ctime(),
        ino: meta.ino(),
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn stat_from_metadata(_meta: &std::fs::Metadata) -> Stat {
    Stat::default()
}
