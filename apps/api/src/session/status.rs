use serde::Serialize;

/// What the host UI needs to draw the save affordance and guard navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub dirty: bool,
    pub saving: bool,
}

/// The three mutually exclusive save states shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveIndicator {
    Saving,
    Unsaved,
    Saved,
}

impl SessionStatus {
    /// `Saving` wins over everything: never report `Saved` with a save in flight.
    pub fn indicator(&self) -> SaveIndicator {
        if self.saving {
            SaveIndicator::Saving
        } else if self.dirty {
            SaveIndicator::Unsaved
        } else {
            SaveIndicator::Saved
        }
    }
}

impl SaveIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            SaveIndicator::Saving => "Saving…",
            SaveIndicator::Unsaved => "Unsaved changes",
            SaveIndicator::Saved => "Saved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloseReport {
    pub had_unsaved_changes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The working copy was written and acknowledged.
    Saved,
    /// Nothing to write; no request was made.
    Clean,
}
