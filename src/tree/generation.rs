//! Build generations and stale-result suppression.
//!
//! Every tree build runs under a `BuildToken`. Starting a newer build (or
//! invalidating explicitly) advances the shared generation, which turns every
//! older token stale. Builders check their token at each suspension point.

use crate::types::BuildGeneration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared generation counter for one tree slot.
#[derive(Debug, Clone, Default)]
pub struct BuildGenerations {
    current: Arc<AtomicU64>,
}

impl BuildGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new build, making every previously issued token stale.
    pub fn begin(&self) -> BuildToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        BuildToken {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidate all outstanding tokens without starting a build.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> BuildGeneration {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle carried by one build.
#[derive(Debug, Clone)]
pub struct BuildToken {
    generation: BuildGeneration,
    current: Arc<AtomicU64>,
}

impl BuildToken {
    /// A token that no other build can invalidate.
    pub fn detached() -> Self {
        BuildGenerations::new().begin()
    }

    pub fn generation(&self) -> BuildGeneration {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }
}
