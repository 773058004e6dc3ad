//! Which videos earlier runs already emitted.
//!
//! The curation run only *reads* this (drops items already seen). Marking
//! happens after the snapshot has been written, so a crashed write means the
//! items come back next run (at-least-once).

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SeenStore: Send + Sync {
    fn contains(&self, video_id: &str) -> bool;
    fn mark_seen(&self, video_ids: &[String]) -> Result<()>;
}

/// Treats everything as new.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSeenStore;

impl SeenStore for NoopSeenStore {
    fn contains(&self, _video_id: &str) -> bool {
        false
    }

    fn mark_seen(&self, _video_ids: &[String]) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySeenStore {
    inner: Mutex<HashSet<String>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("seen store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeenStore for MemorySeenStore {
    fn contains(&self, video_id: &str) -> bool {
        self.inner
            .lock()
            .expect("seen store mutex poisoned")
            .contains(video_id)
    }

    fn mark_seen(&self, video_ids: &[String]) -> Result<()> {
        let mut set = self.inner.lock().expect("seen store mutex poisoned");
        set.extend(video_ids.iter().cloned());
        Ok(())
    }
}

/// JSON array of ids on disk, capped to the most recent `cap` entries.
#[derive(Debug)]
pub struct JsonFileSeenStore {
    path: PathBuf,
    inner: Mutex<Vec<String>>,
    cap: usize,
}

impl JsonFileSeenStore {
    /// Open (or start) the store at `path`. A missing file is an empty store;
    /// a corrupt one is an error, so history is never silently discarded.
    pub fn open(path: impl AsRef<Path>, cap: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ids: Vec<String> = match std::fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Vec::new(),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing seen store {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading seen store {}", path.display()))
            }
        };
        Ok(Self {
            path,
            inner: Mutex::new(ids),
            cap: cap.max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("seen store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SeenStore for JsonFileSeenStore {
    fn contains(&self, video_id: &str) -> bool {
        self.inner
            .lock()
            .expect("seen store mutex poisoned")
            .iter()
            .any(|id| id == video_id)
    }

    fn mark_seen(&self, video_ids: &[String]) -> Result<()> {
        let snapshot = {
            let mut v = self.inner.lock().expect("seen store mutex poisoned");
            for id in video_ids {
                if !v.contains(id) {
                    v.push(id.clone());
                }
            }
            if v.len() > self.cap {
                let excess = v.len() - self.cap;
                v.drain(0..excess);
            }
            v.clone()
        };
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("writing seen store {}", self.path.display()))
    }
}
