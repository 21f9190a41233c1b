//! Report-once channel for per-tick anomalies.
//!
//! An anomaly never stops a tick. The affected collider is left out of that tick, a warning is
//! logged the first time the (collider, kind) combination is seen, and a record is queued for
//! callers to drain.

use rustc_hash::FxHashSet;

/// What went wrong with a collider during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// The collider's entity has no `GlobalTransform`.
    MissingTransform,
    /// The collider's layer is not declared in the layer matrix.
    UnknownLayer,
    /// A collider part failed shape validation.
    InvalidShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub entity: hecs::Entity,
    pub kind: DiagnosticKind,
    pub tick: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: FxHashSet<(hecs::Entity, DiagnosticKind)>,
    pending: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anomaly. Returns `false` if it was already reported for this collider.
    pub fn report(
        &mut self,
        tick: u64,
        entity: hecs::Entity,
        kind: DiagnosticKind,
        message: impl FnOnce() -> String,
    ) -> bool {
        if !self.reported.insert((entity, kind)) {
            return false;
        }
        let message = message();
        tracing::warn!(?entity, ?kind, tick, "{message}");
        self.pending.push(Diagnostic {
            entity,
            kind,
            tick,
            message,
        });
        true
    }

    /// Take every diagnostic queued since the last drain.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.pending)
    }

    /// Whether `kind` has ever been reported for `entity`.
    pub fn was_reported(&self, entity: hecs::Entity, kind: DiagnosticKind) -> bool {
        self.reported.contains(&(entity, kind))
    }

    /// Forget a collider so a later anomaly is reported again, e.g. after it was fixed.
    pub fn forget(&mut self, entity: hecs::Entity) {
        self.reported.retain(|(e, _)| *e != entity);
    }

    /// Drop report-once entries for entities that no longer exist in `world`.
    pub fn prune(&mut self, world: &hecs::World) {
        if !self.reported.is_empty() {
            self.reported.retain(|(e, _)| world.contains(*e));
        }
    }

    /// Number of (collider, kind) combinations currently remembered.
    pub fn remembered(&self) -> usize {
        self.reported.len()
    }
}
