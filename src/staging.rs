//! Temporary on-disk copies of streamed files.
//!
//! A [`TempRegistry`] belongs to one stream adapter. It lazily creates a private
//! temp directory and hands out [`StagedFile`] guards inside it. Each `pipe`
//! works through its own [`TempRegistry::scope`], so sweeping one scope never
//! touches files another scope is still using. The directory goes away once no
//! staged file is tracked, or when the last registry handle is dropped.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::{Builder, NamedTempFile, TempDir};
use tracing::{debug, info, warn};

use crate::file::{Contents, StreamedFile};

#[derive(Default)]
struct State {
    dir: Option<TempDir>,
    /// Staged path -> scope that created it.
    live: HashMap<PathBuf, u64>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    next_scope: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Registry of staged files owned by a single adapter instance.
#[derive(Clone, Default)]
pub struct TempRegistry {
    inner: Arc<Inner>,
    scope: u64,
}

impl TempRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle sharing this registry's directory whose [`cleanup`](Self::cleanup)
    /// only covers files staged through it.
    pub fn scope(&self) -> Self {
        let scope = self.inner.next_scope.fetch_add(1, Ordering::Relaxed) + 1;
        Self {
            inner: self.inner.clone(),
            scope,
        }
    }

    /// Copies the content of `file` into a fresh temp file.
    ///
    /// The returned guard deletes the copy when released or dropped.
    pub async fn stage(&self, file: &StreamedFile) -> io::Result<StagedFile> {
        let temp = self.create_temp(file.extension())?;
        let staged = StagedFile {
            temp: Some(temp),
            inner: self.inner.clone(),
        };

        match &file.contents {
            Contents::Buffer(bytes) => tokio::fs::write(staged.path(), bytes).await?,
            Contents::Disk(source) => {
                tokio::fs::copy(source, staged.path()).await?;
            }
        }
        debug!(
            file = %file.path.display(),
            staged = %staged.path().display(),
            "Staged file content"
        );
        Ok(staged)
    }

    fn create_temp(&self, extension: &str) -> io::Result<NamedTempFile> {
        // The lock is held until the file is tracked, so a sweep cannot
        // remove the directory underneath it.
        let mut state = self.inner.lock();
        let dir_path = match &state.dir {
            Some(dir) => dir.path().to_path_buf(),
            None => {
                let created = Builder::new().prefix("mvn-deploy-stream-").tempdir()?;
                debug!(dir = %created.path().display(), "Created staging directory");
                let path = created.path().to_path_buf();
                state.dir = Some(created);
                path
            }
        };

        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };
        let temp = Builder::new()
            .prefix("staged-")
            .suffix(&suffix)
            .tempfile_in(dir_path)?;
        state.live.insert(temp.path().to_path_buf(), self.scope);
        Ok(temp)
    }

    /// Number of tracked staged files created through this handle.
    pub fn live_count(&self) -> usize {
        self.inner
            .lock()
            .live
            .values()
            .filter(|scope| **scope == self.scope)
            .count()
    }

    /// Path of the staging directory, if one exists right now.
    pub fn dir(&self) -> Option<PathBuf> {
        self.inner.lock().dir.as_ref().map(|d| d.path().to_path_buf())
    }

    /// Removes files staged through this handle that are still tracked, and
    /// the staging directory once nothing else is tracked.
    ///
    /// Safe to call repeatedly; returns how many leftover files were removed.
    pub fn cleanup(&self) -> usize {
        let mut state = self.inner.lock();
        let leftovers: Vec<PathBuf> = state
            .live
            .iter()
            .filter(|(_, scope)| **scope == self.scope)
            .map(|(path, _)| path.clone())
            .collect();

        let mut removed = 0;
        for path in &leftovers {
            state.live.remove(path);
            match std::fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(error = ?e, path = %path.display(), "Failed to remove leftover staged file"),
            }
        }

        if state.live.is_empty() {
            if let Some(dir) = state.dir.take() {
                let dir_path = dir.path().to_path_buf();
                match dir.close() {
                    Ok(()) => debug!(dir = %dir_path.display(), "Removed staging directory"),
                    Err(e) => warn!(error = ?e, dir = %dir_path.display(), "Failed to remove staging directory"),
                }
            }
        }
        if removed > 0 {
            info!(removed, scope = self.scope, "Swept leftover staged files");
        }
        removed
    }
}

/// A temp copy of one streamed file. Deleted on [`StagedFile::release`] or drop.
///
/// If the deletion fails the path stays tracked, so its scope's sweep (or the
/// directory removal) picks it up later.
pub struct StagedFile {
    temp: Option<NamedTempFile>,
    inner: Arc<Inner>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        match &self.temp {
            Some(temp) => temp.path(),
            None => Path::new(""),
        }
    }

    /// Deletes the temp file now. Failures are logged, never returned.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        let path = temp.path().to_path_buf();
        match temp.close() {
            Ok(()) => debug!(staged = %path.display(), "Removed staged file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(error = ?e, staged = %path.display(), "Failed to remove staged file, left for sweep");
                return;
            }
        }
        self.inner.lock().live.remove(&path);
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.remove();
    }
}
