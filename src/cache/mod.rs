use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use crate::tree::TreeNode;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => unreachable!(),
};

/// In-memory cache of inspected archive trees
pub struct TreeCache {
    /// LRU cache mapping archive locators to their trees
    cache: Arc<RwLock<LruCache<String, Arc<TreeNode>>>>,
}

impl TreeCache {
    /// Create a new tree cache holding at most `capacity` trees
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        TreeCache {
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Get a tree, marking it most recently used
    pub fn get(&self, locator: &str) -> Option<Arc<TreeNode>> {
        let mut cache = self.cache.write().ok()?;
        cache.get(locator).cloned()
    }

    pub fn put(&self, locator: String, tree: Arc<TreeNode>) {
        if let Ok(mut cache) = self.cache.write() {
            // push also hands back the previous value of a replaced key
            match cache.push(locator.clone(), tree) {
                Some((evicted, _)) if evicted != locator => {
                    tracing::debug!(locator = %evicted, "archive tree evicted from cache");
                }
                _ => {}
            }
        }
    }

    /// Forget a single archive, e.g. after it was re-uploaded
    pub fn invalidate(&self, locator: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.pop(locator);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for TreeCache {
    fn clone(&self) -> Self {
        TreeCache {
            cache: Arc::clone(&self.cache),
        }
    }
}
