//! Working-directory context used to resolve relative names.

use std::path::{Path, PathBuf};

/// Base directory that relative names are resolved against.
///
/// The context is a plain value: changing directory produces a new
/// `WorkingDir` rather than touching the process-wide current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDir {
    base: PathBuf,
}

impl WorkingDir {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Context rooted at the directory the process was started from.
    pub fn from_process() -> std::io::Result<Self> {
        std::env::current_dir().map(Self::new)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute names are returned unchanged, relative names are joined to
    /// the base. Existence is the caller's concern.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.base.join(name)
        }
    }

    /// Context for `dir`, which must already be resolved and canonical.
    pub fn change_to(&self, dir: PathBuf) -> Self {
        Self { base: dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_names_join_the_base() {
        let cwd = WorkingDir::new("/srv/data");
        assert_eq!(cwd.resolve("a.txt"), PathBuf::from("/srv/data/a.txt"));
        assert_eq!(cwd.resolve("sub/b.txt"), PathBuf::from("/srv/data/sub/b.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_names_are_untouched() {
        let cwd = WorkingDir::new("/srv/data");
        assert_eq!(cwd.resolve("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn change_to_leaves_original_context_intact() {
        let cwd = WorkingDir::new("/srv/data");
        let next = cwd.change_to(PathBuf::from("/srv/other"));
        assert_eq!(cwd.base(), Path::new("/srv/data"));
        assert_eq!(next.resolve("x"), PathBuf::from("/srv/other/x"));
    }
}
