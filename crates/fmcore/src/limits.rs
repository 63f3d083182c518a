/// Maximum length, in bytes, of an absolute path this engine will build.
///
/// Mirrors the host's `PATH_MAX` (4096 on Linux); kept as a crate constant
/// rather than read from `libc::PATH_MAX` so path arithmetic is portable
/// and testable without `cfg(unix)`.
pub const PATH_MAX: usize = 4096;

/// Maximum length, in bytes, of a single path component.
pub const NAME_MAX: usize = 255;
