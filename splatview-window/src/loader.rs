//! Background scene loading.
//!
//! Reading and parsing run on a worker thread; the render loop picks the
//! result up with a non-blocking [`SceneLoader::poll`]. Starting a new load
//! cancels the previous one and any result it still delivers is discarded, so
//! the most recently requested file always wins.

use splatview_data::{SplatBatch, parse_splats_lossy};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A parsed scene ready to be uploaded.
#[derive(Debug)]
pub struct LoadedScene {
    pub generation: u64,
    pub path: PathBuf,
    pub batch: SplatBatch,
}

struct LoadOutcome {
    generation: u64,
    result: Result<LoadedScene, LoadError>,
}

/// Read and parse a scene file on the calling thread.
///
/// A file without a usable header yields an empty batch; only I/O failures
/// are errors.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_scene(path: &Path) -> Result<SplatBatch, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_splats_lossy(&bytes))
}

pub struct SceneLoader {
    sender: Sender<LoadOutcome>,
    receiver: Receiver<LoadOutcome>,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
    pending: bool,
}

impl SceneLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            generation: 0,
            cancel: None,
            pending: false,
        }
    }

    /// Start loading `path` in the background and return its generation.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> Result<u64, LoadError> {
        self.load_with(path.into(), |job| {
            thread::Builder::new()
                .name("scene-loader".into())
                .spawn(job)
                .map(drop)
        })
    }

    /// Start a load on whatever `spawn` runs the job on.
    ///
    /// The previous load is only superseded once the job is running; if
    /// `spawn` fails the loader is left exactly as it was.
    fn load_with<S>(&mut self, path: PathBuf, spawn: S) -> Result<u64, LoadError>
    where
        S: FnOnce(Box<dyn FnOnce() + Send>) -> std::io::Result<()>,
    {
        let generation = self.generation + 1;
        let cancel = Arc::new(AtomicBool::new(false));
        let sender = self.sender.clone();
        let token = cancel.clone();

        info!("Loading scene {} (generation {generation})", path.display());
        spawn(Box::new(move || {
            let _span = info_span!("load_scene", generation).entered();
            let result = load_cancellable(&path, &token);
            let Some(result) = result else {
                debug!("Load of {} cancelled", path.display());
                return;
            };
            let result = result.map(|batch| LoadedScene {
                generation,
                path,
                batch,
            });
            // The receiver lives as long as the loader; a send error means it was dropped.
            let _ = sender.send(LoadOutcome { generation, result });
        }))
        .map_err(LoadError::Spawn)?;

        if let Some(previous) = self.cancel.replace(cancel) {
            previous.store(true, Ordering::Release);
        }
        self.generation = generation;
        self.pending = true;
        Ok(generation)
    }

    /// Whether the latest requested load has not delivered yet.
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take the result of the latest load if it has arrived. Never blocks.
    pub fn poll(&mut self) -> Option<Result<LoadedScene, LoadError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(outcome) => {
                    if let Some(result) = self.accept(outcome) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Block up to `timeout` for the latest load's result.
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<LoadedScene, LoadError>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(outcome) => {
                    if let Some(result) = self.accept(outcome) {
                        return Some(result);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn accept(&mut self, outcome: LoadOutcome) -> Option<Result<LoadedScene, LoadError>> {
        if outcome.generation != self.generation {
            debug!(
                "Discarding stale load (generation {} < {})",
                outcome.generation, self.generation
            );
            return None;
        }
        self.pending = false;
        self.cancel = None;
        if let Err(err) = &outcome.result {
            warn!("Scene load failed: {err}");
        }
        Some(outcome.result)
    }
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn load_cancellable(path: &Path, cancel: &AtomicBool) -> Option<Result<SplatBatch, LoadError>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(source) => {
            return Some(Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            }));
        }
    };
    if cancel.load(Ordering::Acquire) {
        return None;
    }
    let batch = parse_splats_lossy(&bytes);
    if cancel.load(Ordering::Acquire) {
        return None;
    }
    Some(Ok(batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "splatview-loader-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_scene(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let mut text = format!("ply\nformat ascii 1.0\nelement vertex {}\nend_header\n", lines.len());
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_read_scene_parses_file() {
        let dir = temp_dir("read");
        let path = write_scene(&dir, "two.ply", &["0 0 0 0 0 0 255 0 0 0.02", "1 1 1 0 0 0 0 255 0 0.05"]);
        let batch = read_scene(&path).unwrap();
        assert_eq!(batch.len(), 2);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_scene_without_header_is_empty() {
        let dir = temp_dir("noheader");
        let path = dir.join("broken.ply");
        fs::write(&path, "ply\n0 0 0 0 0 0\n").unwrap();
        let batch = read_scene(&path).unwrap();
        assert!(batch.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = temp_dir("missing");
        let result = read_scene(&dir.join("nope.ply"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_background_load_delivers_once() {
        let dir = temp_dir("background");
        let path = write_scene(&dir, "one.ply", &["0.5 0.5 0.5 0 0 0"]);

        let mut loader = SceneLoader::new();
        let generation = loader.load(&path).unwrap();
        assert!(loader.is_loading());

        let scene = loader.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(scene.generation, generation);
        assert_eq!(scene.path, path);
        assert_eq!(scene.batch.len(), 1);
        assert!(!loader.is_loading());
        assert!(loader.poll().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_last_load_wins() {
        let dir = temp_dir("lastwins");
        let first = write_scene(&dir, "first.ply", &["0 0 0 0 0 0"; 3]);
        let second = write_scene(&dir, "second.ply", &["1 1 1 0 0 0"]);

        let mut loader = SceneLoader::new();
        loader.load(&first).unwrap();
        let latest = loader.load(&second).unwrap();

        let scene = loader.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(scene.generation, latest);
        assert_eq!(scene.path, second);
        assert_eq!(scene.batch.len(), 1);

        // Anything the first load still sends is stale.
        thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_load_is_reported() {
        let dir = temp_dir("failed");
        let mut loader = SceneLoader::new();
        loader.load(dir.join("absent.ply")).unwrap();
        let result = loader.wait(TIMEOUT).unwrap();
        assert!(matches!(result, Err(LoadError::Io { .. })));
        assert!(!loader.is_loading());
        fs::remove_dir_all(&dir).unwrap();
    }

    fn refuse_spawn(_job: Box<dyn FnOnce() + Send>) -> std::io::Result<()> {
        Err(std::io::Error::other("no threads left"))
    }

    #[test]
    fn test_spawn_failure_leaves_idle_loader_idle() {
        let mut loader = SceneLoader::new();
        let result = loader.load_with(PathBuf::from("scene.ply"), refuse_spawn);
        assert!(matches!(result, Err(LoadError::Spawn(_))));
        assert!(!loader.is_loading());
        assert_eq!(loader.generation(), 0);
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_spawn_failure_keeps_previous_load() {
        let dir = temp_dir("spawnfail");
        let path = write_scene(&dir, "kept.ply", &["0 0 0 0 0 0"]);

        let mut loader = SceneLoader::new();
        let generation = loader.load(&path).unwrap();
        let result = loader.load_with(dir.join("other.ply"), refuse_spawn);
        assert!(matches!(result, Err(LoadError::Spawn(_))));
        assert_eq!(loader.generation(), generation);
        assert!(loader.is_loading());

        let scene = loader.wait(TIMEOUT).unwrap().unwrap();
        assert_eq!(scene.generation, generation);
        assert_eq!(scene.path, path);
        assert!(!loader.is_loading());
        fs::remove_dir_all(&dir).unwrap();
    }
}
