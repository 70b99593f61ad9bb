use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::image::StoredImage;

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub image: Arc<StoredImage>,
    pub etag: String,
    pub created_at: Instant,
}

// Fetched images keyed by storage path, at most max_entries of them
pub struct ImageCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl ImageCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    // Fresh entry for the path, if any
    pub fn get(&self, path: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(path)?;
        if entry.created_at.elapsed() < self.ttl {
            return Some(entry.clone());
        }
        drop(entry);
        self.entries.remove(path);
        None
    }

    pub fn insert(&self, path: &str, image: StoredImage) -> CacheEntry {
        let entry = CacheEntry {
            etag: make_etag(&image.body),
            image: Arc::new(image),
            created_at: Instant::now(),
        };
        // zero TTL or zero capacity means caching is off
        if self.ttl.is_zero() || self.max_entries == 0 {
            return entry;
        }

        self.evict_expired();
        while self.entries.len() >= self.max_entries && !self.entries.contains_key(path) {
            if !self.evict_oldest() {
                break;
            }
        }
        self.entries.insert(path.to_string(), entry.clone());
        entry
    }

    // Drop every entry past its TTL
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created_at.elapsed() < ttl);
        before.saturating_sub(self.entries.len())
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(path) => self.entries.remove(&path).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Strong ETag (quoted SHA-256 of the body)
pub fn make_etag(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("\"{:x}\"", hasher.finalize())
}
