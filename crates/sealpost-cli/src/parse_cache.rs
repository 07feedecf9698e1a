//! On-disk parse cache shared with the mail reader.
//!
//! Cached crypto evaluations live under `<dir>/<scope>/`. Invalidating a
//! scope removes its directory; [`CacheScope::All`] removes everything.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sealpost_core::{CacheScope, ParseCache};
use tracing::{debug, warn};

/// A [`ParseCache`] backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FsParseCache {
    dir: PathBuf,
}

impl FsParseCache {
    /// Use `dir` as the cache root. Nothing is created until needed.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache root.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding entries of `scope`.
    #[must_use]
    pub fn scope_dir(&self, scope: CacheScope) -> PathBuf {
        match scope {
            CacheScope::All => self.dir.clone(),
            CacheScope::PgpMime => self.dir.join(scope.to_string()),
        }
    }
}

impl ParseCache for FsParseCache {
    fn invalidate(&self, scope: CacheScope) {
        let target = self.scope_dir(scope);
        match std::fs::remove_dir_all(&target) {
            Ok(()) => debug!(%scope, path = %target.display(), "parse cache invalidated"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%scope, "parse cache already empty");
            },
            Err(e) => warn!(%scope, path = %target.display(), error = %e, "parse cache invalidation failed"),
        }
    }
}
