//! File system helpers
//!
//! Locations in configuration may name either a bundled resource or a plain
//! file system path. Resources are looked up below a list of resource roots
//! before the location is tried as a path of its own.

use std::fs;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Finds configuration resources below a set of roots, then on the file system
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    roots: Vec<PathBuf>,
}

impl ResourceLocator {
    /// Create a locator with the given resource roots
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Resource roots searched before the plain path
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve `location` to a readable path
    ///
    /// Resource roots are tried in order, then `location` itself. Nothing is
    /// cached: every call goes back to the file system.
    pub fn locate(&self, location: &str) -> Option<PathBuf> {
        if location.trim().is_empty() {
            return None;
        }

        let relative = location.trim_start_matches('/');
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .chain(std::iter::once(PathBuf::from(location)))
            .find(|candidate| is_readable(candidate))
    }

    /// Check whether `location` resolves to something readable
    pub fn exists(&self, location: &str) -> bool {
        self.locate(location).is_some()
    }

    /// Read the bytes of the resource at `location`
    pub fn read(&self, location: &str) -> io::Result<Option<(PathBuf, Vec<u8>)>> {
        match self.locate(location) {
            Some(path) => {
                let bytes = fs::read(&path)?;
                Ok(Some((path, bytes)))
            }
            None => Ok(None),
        }
    }
}

/// Check that a path exists and can be opened for reading
///
/// Directories count as readable when they can be listed.
pub fn is_readable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
        Ok(_) => File::open(path).is_ok(),
        Err(_) => false,
    }
}
