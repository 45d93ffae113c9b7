use serde::{Deserialize, Serialize};

/// Which surface is in front: the horizontal track, or one tile's detail modal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackView {
    #[default]
    Track,
    Detail { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackViewEvent {
    SelectTile(usize),
    Close,
    /// Carries the first locked tile as of the caller's `now`, if any.
    ScrollToNext(Option<usize>),
    ResetImages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackViewEffect {
    None,
    ScrollTo(usize),
    ClearImages,
}

impl TrackView {
    /// Pure transition function. Side effects are reported through `TrackViewEffect` for the
    /// caller to apply.
    pub fn handle(self, event: TrackViewEvent) -> (TrackView, TrackViewEffect) {
        match (self, event) {
            (TrackView::Track, TrackViewEvent::SelectTile(index)) => {
                (TrackView::Detail { index }, TrackViewEffect::None)
            }
            (TrackView::Track, TrackViewEvent::ScrollToNext(Some(index))) => {
                (TrackView::Track, TrackViewEffect::ScrollTo(index))
            }
            (TrackView::Track, TrackViewEvent::ResetImages) => {
                (TrackView::Track, TrackViewEffect::ClearImages)
            }

            (TrackView::Detail { .. }, TrackViewEvent::Close) => {
                (TrackView::Track, TrackViewEffect::None)
            }

            // Ignore irrelevant events in the current state.
            (state, _) => (state, TrackViewEffect::None),
        }
    }

    pub fn detail_index(self) -> Option<usize> {
        match self {
            TrackView::Detail { index } => Some(index),
            TrackView::Track => None,
        }
    }

    pub fn is_detail(self) -> bool {
        matches!(self, TrackView::Detail { .. })
    }
}
