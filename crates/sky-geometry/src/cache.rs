//! Memoized projection
//!
//! Each widget keeps its own cache; an entry is reused only while the exact
//! input bits stay the same.

use crate::{Projector, ScreenPosition};

/// Single-entry memo in front of a [`Projector`]
#[derive(Debug, Clone)]
pub struct CachedProjector {
    projector: Projector,
    last: Option<((u64, u64), ScreenPosition)>,
    hits: u64,
}

impl CachedProjector {
    pub fn new(projector: Projector) -> Self {
        Self {
            projector,
            last: None,
            hits: 0,
        }
    }

    pub fn project(&mut self, azimuth: f64, elevation: f64) -> ScreenPosition {
        let key = (azimuth.to_bits(), elevation.to_bits());
        if let Some((cached_key, pos)) = self.last {
            if cached_key == key {
                self.hits += 1;
                return pos;
            }
        }

        let pos = self.projector.project(azimuth, elevation);
        self.last = Some((key, pos));
        pos
    }

    /// Swap projection settings; drops the memo
    pub fn set_projector(&mut self, projector: Projector) {
        if self.projector != projector {
            self.projector = projector;
            self.invalidate();
        }
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Number of lookups answered from the memo
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// Sun and moon caches for one widget
#[derive(Debug, Clone)]
pub struct SkyProjectors {
    pub sun: CachedProjector,
    pub moon: CachedProjector,
}

impl SkyProjectors {
    pub fn new(projector: Projector) -> Self {
        Self {
            sun: CachedProjector::new(projector),
            moon: CachedProjector::new(projector),
        }
    }

    pub fn set_projector(&mut self, projector: Projector) {
        self.sun.set_projector(projector);
        self.moon.set_projector(projector);
    }

    pub fn projector(&self) -> &Projector {
        self.sun.projector()
    }
}

impl Default for SkyProjectors {
    fn default() -> Self {
        Self::new(Projector::default())
    }
}
