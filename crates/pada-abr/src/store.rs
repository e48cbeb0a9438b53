//! One [`AdaptationState`] per media kind, created on first use.

use pada_events::MediaKind;

use crate::state::{AdaptationState, Lifecycle};

#[derive(Debug, Default)]
pub struct StateStore {
    states: [Option<AdaptationState>; MediaKind::COUNT],
}

impl StateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, kind: MediaKind) -> Option<&AdaptationState> {
        self.states[kind.index()].as_ref()
    }

    pub fn get_mut(&mut self, kind: MediaKind) -> Option<&mut AdaptationState> {
        self.states[kind.index()].as_mut()
    }

    /// State for `kind`, built by `init` on first access.
    ///
    /// The second value is `true` when the state was created by this call.
    pub fn get_or_create(
        &mut self,
        kind: MediaKind,
        init: impl FnOnce() -> AdaptationState,
    ) -> (&mut AdaptationState, bool) {
        let slot = &mut self.states[kind.index()];
        let created = slot.is_none();
        (slot.get_or_insert_with(init), created)
    }

    /// Multi-bitrate state for `kind`, if one exists.
    pub fn adaptive_mut(&mut self, kind: MediaKind) -> Option<&mut AdaptationState> {
        self.get_mut(kind)
            .filter(|s| s.lifecycle != Lifecycle::SingleBitrate)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AdaptationState> {
        self.states.iter_mut().flatten()
    }

    /// Drop every state (player reset or teardown).
    pub fn reset_all(&mut self) {
        self.states = Default::default();
    }

    /// Return every multi-bitrate state to startup.
    pub fn reset_for_seek(&mut self) {
        for state in self.iter_mut() {
            state.reset_for_seek();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
