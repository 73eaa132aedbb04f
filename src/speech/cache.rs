//! Two-tier audio cache
//!
//! In-memory map plus an optional on-disk directory, keyed by
//! `hex(sha256(voice + ":" + text))` so a voice change automatically
//! misses until the voice is switched back.
//!
//! Disk behavior:
//!   - disk configured + writes enabled: read mem, then disk; write both.
//!   - disk configured + writes disabled: disk is still read (warm start
//!     from previous runs), but nothing new is persisted.
//!   - no disk dir: pure in-memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use super::truncate;

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Vec<u8>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe two-tier cache for synthesized audio
pub struct AudioCache {
    state: RwLock<CacheState>,
    voice: String,
    cache_dir: Option<PathBuf>,
    disk_write: bool,
}

impl AudioCache {
    /// Create an audio cache.
    ///
    /// `voice` is baked into every key. `cache_dir` of `None` disables
    /// the disk layer entirely; `disk_write` controls whether new
    /// entries are persisted (reads happen either way).
    #[must_use]
    pub fn new(voice: &str, cache_dir: Option<PathBuf>, disk_write: bool) -> Self {
        if let (Some(dir), true) = (&cache_dir, disk_write) {
            if let Err(e) = create_dir_0755(dir) {
                tracing::error!(dir = %dir.display(), error = %e, "cache: failed to create cache dir");
            }
        }
        Self {
            state: RwLock::new(CacheState::default()),
            voice: voice.to_string(),
            cache_dir,
            disk_write,
        }
    }

    /// Cached audio for the text, checking memory then disk.
    /// Disk hits are promoted to memory.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Vec<u8>> {
        let key = self.hash_key(text);

        {
            let state = self.state.read().expect("audio cache poisoned");
            if let Some(data) = state.entries.get(&key) {
                let data = data.clone();
                drop(state);
                self.state.write().expect("audio cache poisoned").hits += 1;
                tracing::debug!(text = %truncate(text, 40), bytes = data.len(), "cache hit (mem)");
                return Some(data);
            }
        }

        if let Some(dir) = &self.cache_dir {
            if let Ok(data) = std::fs::read(disk_path(dir, &key)) {
                let mut state = self.state.write().expect("audio cache poisoned");
                state.entries.insert(key, data.clone());
                state.hits += 1;
                drop(state);
                tracing::debug!(text = %truncate(text, 40), bytes = data.len(), "cache hit (disk)");
                return Some(data);
            }
        }

        self.state.write().expect("audio cache poisoned").misses += 1;
        None
    }

    /// Store audio for the text. Memory always; disk only when writes
    /// are enabled.
    pub fn put(&self, text: &str, audio: Vec<u8>) {
        let key = self.hash_key(text);

        let size = {
            let mut state = self.state.write().expect("audio cache poisoned");
            state.entries.insert(key.clone(), audio.clone());
            state.entries.len()
        };
        tracing::debug!(
            text = %truncate(text, 40),
            bytes = audio.len(),
            entries = size,
            "cache store (mem)"
        );

        if let Some(dir) = &self.cache_dir {
            if self.disk_write {
                let path = disk_path(dir, &key);
                match write_file_0644(&path, &audio) {
                    Ok(()) => {
                        tracing::debug!(key = %&key[..12], bytes = audio.len(), "cache store (disk)");
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "cache: disk write failed");
                    }
                }
            }
        }
    }

    /// True if audio for the text is cached in either tier
    #[must_use]
    pub fn has(&self, text: &str) -> bool {
        let key = self.hash_key(text);
        if self
            .state
            .read()
            .expect("audio cache poisoned")
            .entries
            .contains_key(&key)
        {
            return true;
        }
        self.cache_dir
            .as_ref()
            .is_some_and(|dir| disk_path(dir, &key).exists())
    }

    /// Number of in-memory entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().expect("audio cache poisoned").entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit and miss counts
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        let state = self.state.read().expect("audio cache poisoned");
        (state.hits, state.misses)
    }

    /// Empty the in-memory tier. The disk cache is left alone.
    pub fn clear(&self) {
        let mut state = self.state.write().expect("audio cache poisoned");
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        tracing::debug!("cache cleared (mem)");
    }

    fn hash_key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.voice.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

fn disk_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.wav"))
}

fn create_dir_0755(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

fn write_file_0644(path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
    }
    Ok(())
}
