//! Persisted per-tile images.
//!
//! The in-memory mapping is loaded once when the store is created and every write re-serialises
//! the whole mapping through the backend. There are no partial writes; the last writer wins.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STORE_PATH_ENV: &str = "REVEAL_TRACK_STORE";
const STORE_VERSION: u32 = 1;

/// Tile id to raw image bytes.
pub type ImageMap = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write image store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode image store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where the image mapping lives between sessions.
pub trait ImageBackend {
    /// Previously persisted images. Missing or corrupt data yields an empty mapping.
    fn load_all(&self) -> ImageMap;

    /// Replaces everything persisted with `images`.
    fn save_all(&mut self, images: &ImageMap) -> Result<(), StoreError>;

    fn clear(&mut self) -> Result<(), StoreError> {
        self.save_all(&ImageMap::new())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    images: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    STORE_VERSION
}

/// JSON file with base64-encoded image bytes.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `explicit`, else `REVEAL_TRACK_STORE`, else `reveal-track/images.json` under the user's
    /// data directory.
    pub fn from_env(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::new(path);
        }
        if let Some(path) = std::env::var_os(STORE_PATH_ENV) {
            return Self::new(path);
        }

        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".local");
                    p.push("share");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("reveal-track");
        path.push("images.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(bytes: &[u8]) -> Option<ImageMap> {
        let doc: StoredDocument = serde_json::from_slice(bytes).ok()?;
        doc.images
            .into_iter()
            .map(|(id, encoded)| STANDARD.decode(encoded).ok().map(|raw| (id, raw)))
            .collect()
    }
}

impl ImageBackend for JsonFileBackend {
    fn load_all(&self) -> ImageMap {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return ImageMap::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "image store unreadable; starting empty");
                return ImageMap::new();
            }
        };
        match Self::decode(&bytes) {
            Some(images) => {
                tracing::debug!(path = %self.path.display(), count = images.len(), "image store loaded");
                images
            }
            None => {
                tracing::warn!(path = %self.path.display(), "image store corrupt; starting empty");
                ImageMap::new()
            }
        }
    }

    fn save_all(&mut self, images: &ImageMap) -> Result<(), StoreError> {
        let doc = StoredDocument {
            version: STORE_VERSION,
            images: images
                .iter()
                .map(|(id, raw)| (id.clone(), STANDARD.encode(raw)))
                .collect(),
        };
        let text = serde_json::to_string_pretty(&doc)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(&self.path, text).map_err(write_err)
    }
}

/// Non-persistent backend for ephemeral sessions and tests.
///
/// Clones share the same mapping, so a test can keep a handle and inspect what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    persisted: Rc<RefCell<ImageMap>>,
    saves: Rc<Cell<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(images: ImageMap) -> Self {
        Self {
            persisted: Rc::new(RefCell::new(images)),
            saves: Rc::default(),
        }
    }

    pub fn snapshot(&self) -> ImageMap {
        self.persisted.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl ImageBackend for MemoryBackend {
    fn load_all(&self) -> ImageMap {
        self.snapshot()
    }

    fn save_all(&mut self, images: &ImageMap) -> Result<(), StoreError> {
        *self.persisted.borrow_mut() = images.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Sniffs the container format from the leading bytes.
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Result of [`ImageStore::put`]. The entry is in memory either way; `saved` says whether the
/// backend has it too.
#[derive(Debug)]
pub struct PutOutcome {
    pub replaced: bool,
    pub saved: Result<(), StoreError>,
}

/// Owner of the per-tile image mapping for one session.
pub struct ImageStore {
    backend: Box<dyn ImageBackend>,
    images: ImageMap,
    generation: u64,
}

impl ImageStore {
    pub fn open(backend: impl ImageBackend + 'static) -> Self {
        let images = backend.load_all();
        Self {
            backend: Box::new(backend),
            images,
            generation: 0,
        }
    }

    pub fn get(&self, tile_id: &str) -> Option<&[u8]> {
        self.images.get(tile_id).map(Vec::as_slice)
    }

    pub fn contains(&self, tile_id: &str) -> bool {
        self.images.contains_key(tile_id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Bumped on every mutation; lets display caches tell whether their copy is current.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores `bytes` for `tile_id` and persists the whole mapping.
    ///
    /// The in-memory entry is kept even if persisting fails.
    pub fn put(&mut self, tile_id: &str, bytes: Vec<u8>) -> PutOutcome {
        let replaced = self.images.insert(tile_id.to_string(), bytes).is_some();
        self.generation += 1;
        PutOutcome {
            replaced,
            saved: self.backend.save_all(&self.images),
        }
    }

    /// Clears the backend, then memory. On failure nothing is cleared, so the session keeps
    /// showing what the next launch would load.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.backend.clear()?;
        self.images.clear();
        self.generation += 1;
        Ok(())
    }
}
