use crate::catalog::{Artwork, ArtworkId};
use std::collections::HashSet;

/// Every artwork discovered since process start, in discovery order.
#[derive(Debug, Default)]
pub struct DiscoveryRegistry {
    ids: HashSet<ArtworkId>,
    ordered: Vec<Artwork>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: ArtworkId) -> bool {
        self.ids.contains(&id)
    }

    /// Records the artwork on first sight. Returns `false` without mutating when already known.
    pub fn record_if_new(&mut self, artwork: &Artwork) -> bool {
        if !self.ids.insert(artwork.id) {
            return false;
        }
        self.ordered.push(artwork.clone());
        true
    }

    pub fn list_all(&self) -> &[Artwork] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
