use std::collections::HashMap;
use egui::{Context, TextureHandle, TextureId, ColorImage, TextureOptions};
use thiserror::Error;

use crate::surface::NodeId;

/// Errors that can occur while uploading a mask texture
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Failed to generate texture")]
    GenerationFailed,
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
}

/// Caches uploaded mask textures per node and fill version
pub struct TextureManager {
    /// Cache of textures by (node, fill version)
    texture_cache: HashMap<(NodeId, u64), TextureHandle>,
    /// Tracks when each texture was last used
    last_used: HashMap<(NodeId, u64), u64>,
    /// Current frame counter for LRU tracking
    current_frame: u64,
    /// Maximum number of textures to cache
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("cached", &self.texture_cache.len())
            .field("current_frame", &self.current_frame)
            .field("max_cache_size", &self.max_cache_size)
            .finish()
    }
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Should be called at the start of each painted frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Gets or uploads the texture for a node's current fill
    pub fn get_or_create_texture<F>(
        &mut self,
        node: NodeId,
        fill_version: u64,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        let cache_key = (node, fill_version);

        if let Some(handle) = self.texture_cache.get(&cache_key) {
            self.last_used.insert(cache_key, self.current_frame);
            return Ok(handle.id());
        }

        let image = generator()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(TextureGenerationError::InvalidDimensions);
        }

        let name = format!("{}_fill_v{}", node, fill_version);
        let handle = ctx.load_texture(&name, image, TextureOptions::LINEAR);
        log::debug!("Uploaded mask texture {}", name);

        self.texture_cache.insert(cache_key, handle.clone());
        self.last_used.insert(cache_key, self.current_frame);
        self.prune_cache_if_needed();

        Ok(handle.id())
    }

    /// Drops every cached version for a node
    pub fn invalidate_node(&mut self, node: NodeId) {
        self.texture_cache.retain(|(id, _), _| *id != node);
        self.last_used.retain(|(id, _), _| *id != node);
    }

    /// Evicts least recently used textures beyond the cache limit
    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() <= self.max_cache_size {
            return;
        }

        let mut entries: Vec<((NodeId, u64), u64)> = self.last_used
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() - self.max_cache_size;
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    pub fn get_texture(&self, node: NodeId, version: u64) -> Option<&TextureHandle> {
        self.texture_cache.get(&(node, version))
    }
}
