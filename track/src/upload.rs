//! Off-thread reads of user-supplied image files.
//!
//! Reading happens on a worker thread; the result comes back over a channel and is applied on
//! the loop thread, where eligibility is checked again.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reader for {path} exited without a result")]
    Disconnected { path: PathBuf },
}

#[derive(Debug)]
pub struct UploadedFile {
    pub tile_id: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// One in-flight file read.
#[derive(Debug)]
pub struct UploadTask {
    tile_id: String,
    path: PathBuf,
    rx: Receiver<io::Result<Vec<u8>>>,
}

impl UploadTask {
    pub fn spawn(tile_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::spawn_with(tile_id, path, |path| fs::read(path))
    }

    /// Like [`UploadTask::spawn`] with a custom reader.
    pub fn spawn_with<F>(tile_id: impl Into<String>, path: impl Into<PathBuf>, read: F) -> Self
    where
        F: FnOnce(&Path) -> io::Result<Vec<u8>> + Send + 'static,
    {
        let tile_id = tile_id.into();
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            // The receiver is gone if the task was superseded.
            let _ = tx.send(read(&worker_path));
        });
        tracing::debug!(tile = %tile_id, path = %path.display(), "upload read started");
        Self { tile_id, path, rx }
    }

    pub fn tile_id(&self) -> &str {
        &self.tile_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` while the read is still running.
    pub fn try_finish(&self) -> Option<Result<UploadedFile, UploadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(self.resolve(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(UploadError::Disconnected {
                path: self.path.clone(),
            })),
        }
    }

    /// Blocks until the read finishes.
    pub fn wait(self) -> Result<UploadedFile, UploadError> {
        match self.rx.recv() {
            Ok(result) => self.resolve(result),
            Err(_) => Err(UploadError::Disconnected { path: self.path }),
        }
    }

    fn resolve(&self, result: io::Result<Vec<u8>>) -> Result<UploadedFile, UploadError> {
        match result {
            Ok(bytes) => Ok(UploadedFile {
                tile_id: self.tile_id.clone(),
                path: self.path.clone(),
                bytes,
            }),
            Err(source) => Err(UploadError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Pending uploads keyed by tile id. A newer upload for a tile replaces the pending one, so at
/// most one write per tile is ever in flight.
#[derive(Debug, Default)]
pub struct UploadQueue {
    pending: BTreeMap<String, UploadTask>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an earlier pending upload for the same tile was dropped.
    pub fn start(&mut self, tile_id: &str, path: impl Into<PathBuf>) -> bool {
        self.push(UploadTask::spawn(tile_id, path))
    }

    pub fn push(&mut self, task: UploadTask) -> bool {
        let superseded = self.pending.insert(task.tile_id.clone(), task);
        if let Some(old) = &superseded {
            tracing::debug!(tile = %old.tile_id, path = %old.path.display(), "pending upload superseded");
        }
        superseded.is_some()
    }

    /// Collects every finished read, in tile id order.
    pub fn poll(&mut self) -> Vec<(String, Result<UploadedFile, UploadError>)> {
        let mut finished = Vec::new();
        self.pending.retain(|tile_id, task| match task.try_finish() {
            Some(result) => {
                finished.push((tile_id.clone(), result));
                false
            }
            None => true,
        });
        finished
    }

    pub fn is_pending(&self, tile_id: &str) -> bool {
        self.pending.contains_key(tile_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn poll_until_done(queue: &mut UploadQueue) -> Vec<(String, Result<UploadedFile, UploadError>)> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while !queue.is_empty() && Instant::now() < deadline {
            out.extend(queue.poll());
            thread::sleep(Duration::from_millis(5));
        }
        out
    }

    #[test]
    fn task_delivers_bytes() {
        let task = UploadTask::spawn_with("a", "a.png", |_| Ok(vec![1, 2, 3]));
        let file = task.wait().expect("read should succeed");
        assert_eq!(file.tile_id, "a");
        assert_eq!(file.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn read_failure_is_reported_with_path() {
        let task = UploadTask::spawn_with("a", "missing.png", |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        let err = task.wait().expect_err("read should fail");
        assert!(matches!(err, UploadError::Read { ref path, .. } if path == Path::new("missing.png")));
    }

    #[test]
    fn newer_upload_supersedes_pending_one() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut queue = UploadQueue::new();
        assert!(!queue.push(UploadTask::spawn_with("a", "old.png", move |_| {
            let _ = release_rx.recv();
            Ok(vec![0])
        })));
        assert!(queue.push(UploadTask::spawn_with("a", "new.png", |_| Ok(vec![1]))));
        assert_eq!(queue.len(), 1);
        drop(release_tx);

        let done = poll_until_done(&mut queue);
        assert_eq!(done.len(), 1);
        let (tile, result) = &done[0];
        assert_eq!(tile, "a");
        assert_eq!(result.as_ref().expect("read").bytes, vec![1]);
    }

    #[test]
    fn missing_file_resolves_to_read_error() {
        let mut queue = UploadQueue::new();
        queue.start("a", "/definitely/not/here.png");
        assert!(queue.is_pending("a"));

        let done = poll_until_done(&mut queue);
        assert!(matches!(done[0].1, Err(UploadError::Read { .. })));
        assert!(!queue.is_pending("a"));
    }
}
