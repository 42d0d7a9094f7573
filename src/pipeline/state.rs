/// Run stage definitions for tracking pipeline progress
use std::fmt;

/// Represents where a pipeline run currently is
///
/// ```text
/// Start -> Scraping -> Enriching -> Uploading -> Done
///             |            |
///             v            v
///          Aborted      Aborted
/// ```
///
/// A run that skips the upload moves from `Enriching` straight to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStage {
    /// Nothing has happened yet
    Start,

    /// Listing catalog items
    Scraping,

    /// Fetching details and embedding, one item at a time
    Enriching,

    /// Sending batches to the index
    Uploading,

    // ===== Terminal States =====
    /// Run finished
    Done,

    /// Run stopped before upload: empty catalog or zero vectors
    Aborted,
}

impl RunStage {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if `next` is a legal successor of this stage
    pub fn can_transition_to(&self, next: RunStage) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::Scraping)
                | (Self::Scraping, Self::Enriching)
                | (Self::Scraping, Self::Aborted)
                | (Self::Enriching, Self::Uploading)
                | (Self::Enriching, Self::Done)
                | (Self::Enriching, Self::Aborted)
                | (Self::Uploading, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Scraping => "scraping",
            Self::Enriching => "enriching",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
