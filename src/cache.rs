use lru::LruCache;
use slotmap::SlotMap;

use crate::{
    backend::ErasedBackend,
    sprite::{AllocationError, EncodedSprite, HeapAllocator, SpriteAllocator, SpriteDescriptor},
};

slotmap::new_key_type! {
    /// ID of a sprite stored in a [`SpriteCache`].
    pub struct SpriteId;
}

/// Owns encoded sprites within a fixed memory budget.
///
/// The cache is the allocator handed to [`ErasedBackend::encode`]: when a
/// new sprite does not fit, least recently used sprites are evicted to
/// make room. IDs of evicted sprites simply stop resolving.
pub struct SpriteCache {
    sprites: SlotMap<SpriteId, EncodedSprite>,
    recency: LruCache<SpriteId, ()>, // sizes live in `sprites`

    budget: usize,
    used: usize,
}

impl SpriteCache {
    pub fn new(budget: usize) -> Self {
        Self {
            sprites: SlotMap::with_key(),
            recency: LruCache::unbounded(),
            budget,
            used: 0,
        }
    }

    /// Encodes `sprite` with `backend` and stores the result.
    pub fn encode(
        &mut self,
        backend: &dyn ErasedBackend,
        sprite: &SpriteDescriptor,
    ) -> Result<SpriteId, AllocationError> {
        let encoded = backend.encode(sprite, self)?;
        log::debug!(
            "Encoded {}x{} sprite for '{}' into {} bytes",
            sprite.width,
            sprite.height,
            backend.name(),
            encoded.byte_size()
        );
        Ok(self.insert(encoded))
    }

    /// Stores an already encoded sprite.
    pub fn insert(&mut self, sprite: EncodedSprite) -> SpriteId {
        self.used += sprite.byte_size();
        let id = self.sprites.insert(sprite);
        self.recency.put(id, ());
        id
    }

    /// Gets a sprite, marking it as recently used.
    pub fn get(&mut self, id: SpriteId) -> Option<&EncodedSprite> {
        self.recency.get(&id)?;
        self.sprites.get(id)
    }

    /// Gets a sprite without touching its recency.
    pub fn peek(&self, id: SpriteId) -> Option<&EncodedSprite> {
        self.sprites.get(id)
    }

    pub fn contains(&self, id: SpriteId) -> bool {
        self.sprites.contains_key(id)
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<EncodedSprite> {
        self.recency.pop(&id);
        let sprite = self.sprites.remove(id)?;
        self.used -= sprite.byte_size();
        Some(sprite)
    }

    /// Drops every sprite. Must be called after the active backend
    /// changes, since stored sprites are only valid for their encoder.
    pub fn invalidate(&mut self) {
        log::info!(
            "Invalidating sprite cache ({} sprites, {} bytes)",
            self.sprites.len(),
            self.used
        );
        self.sprites.clear();
        self.recency.clear();
        self.used = 0;
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Bytes held by stored sprites.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    fn evict_lru(&mut self) -> bool {
        let (id, ()) = match self.recency.pop_lru() {
            Some(entry) => entry,
            None => return false,
        };
        if let Some(sprite) = self.sprites.remove(id) {
            self.used -= sprite.byte_size();
            log::debug!("Evicted {} byte sprite from the sprite cache", sprite.byte_size());
        }
        true
    }
}

impl SpriteAllocator for SpriteCache {
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, AllocationError> {
        if size > self.budget {
            return Err(AllocationError { requested: size });
        }
        while self.used + size > self.budget {
            if !self.evict_lru() {
                break;
            }
        }
        HeapAllocator.allocate(size)
    }
}
