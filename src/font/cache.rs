// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Process-wide cache of font file bytes keyed by path.
//!
//! Several renderers in one process usually share the same two or three
//! font files. The first get() of a path reads the file once, later calls
//! hand out the same buffer. Failed loads are cached too, a missing font
//! is reported once and the builder skips it.

use log::warn;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, RwLock};

pub struct FontCache {
    cache: RwLock<HashMap<String, Option<Arc<Vec<u8>>>>>,
}

impl FontCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Bytes of the font file at path, or None when it cannot be read.
    /// Reads may proceed in parallel, the first miss holds the write lock
    /// for the duration of the file read.
    pub fn get(&self, path: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(hit) = self.cache.read().unwrap().get(path) {
            return hit.clone();
        }

        let mut cache = self.cache.write().unwrap();
        // another thread may have filled the slot while we waited
        if let Some(hit) = cache.get(path) {
            return hit.clone();
        }

        let loaded = match fs::read(path) {
            Ok(bytes) => Some(Arc::new(bytes)),
            Err(e) => {
                warn!("font cache: cannot read '{}': {}", path, e);
                None
            }
        };
        cache.insert(path.to_string(), loaded.clone());
        loaded
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
