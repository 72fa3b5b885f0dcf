// Absolute path check shared by the direct and redirecting executors

/// Path root marker on POSIX
pub const ROOT_MARKER: char = '/';

/// Returns true iff `path` is present and starts at the filesystem root.
///
/// Purely syntactic: the file is not required to exist or be executable.
pub fn is_absolute<'a>(path: impl Into<Option<&'a str>>) -> bool {
    path.into().is_some_and(|p| p.starts_with(ROOT_MARKER))
}
