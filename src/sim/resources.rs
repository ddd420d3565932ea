//! Resource registry: which actor kinds have had their asset batch
//! initialized. The registry is an explicit object handed to the level
//! at construction and keyed by `ActorKind`; the first spawn of a kind
//! marks it and surfaces a `ResourcesRequested` event for the asset
//! collaborator. No global or per-type static caches.

use std::collections::BTreeSet;

use crate::domain::actor::ActorKind;

#[derive(Default, Debug)]
pub struct ResourceRegistry {
    loaded: BTreeSet<ActorKind>,
}

impl ResourceRegistry {
    pub fn new() -> ResourceRegistry {
        ResourceRegistry::default()
    }

    /// Registry with kinds already initialized during an explicit
    /// preload phase (e.g. a loading screen).
    pub fn preloaded(kinds: &[ActorKind]) -> ResourceRegistry {
        ResourceRegistry { loaded: kinds.iter().copied().collect() }
    }

    pub fn is_loaded(&self, kind: ActorKind) -> bool {
        self.loaded.contains(&kind)
    }

    /// Mark a kind as initialized. Returns true the first time, which is
    /// the caller's cue to request the asset batch.
    pub fn mark(&mut self, kind: ActorKind) -> bool {
        self.loaded.insert(kind)
    }
}
