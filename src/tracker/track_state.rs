/// Track lifecycle state.
///
/// `Tentative -> Confirmed -> Lost -> Confirmed | Retired`, and
/// `Tentative -> Retired` for tracks that never stabilise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackState {
    /// Newly created track, not yet matched on enough consecutive frames
    #[default]
    Tentative,
    /// Stable track, eligible for boundary evaluation
    Confirmed,
    /// Confirmed track that missed at least one frame
    Lost,
    /// Terminal; no longer in the active set
    Retired,
}

impl TrackState {
    pub fn is_active(self) -> bool {
        self != TrackState::Retired
    }
}
