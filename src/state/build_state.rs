/// Build state definitions for the checkpointed corpus builder
///
/// A run starts in `Fresh` or `Resuming`, extracts works while `Running`,
/// becomes `Drained` once every discovered id was attempted, and ends
/// `Committed` when the final snapshot is written and the checkpoint removed.
use std::fmt;

/// Represents the current state of a corpus build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    /// No checkpoint in use; building from an empty corpus
    Fresh,

    /// Checkpoint loaded; corpus pre-populated from it
    Resuming,

    /// Actively extracting works
    Running,

    /// Every discovered work id has been attempted
    Drained,

    /// Final snapshot written, checkpoint discarded
    Committed,
}

impl BuildState {
    /// Returns true if `self` may be entered at the start of a run
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Fresh | Self::Resuming)
    }

    /// Returns true if this is the terminal state of a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: BuildState) -> bool {
        matches!(
            (self, next),
            (Self::Fresh, Self::Running)
                | (Self::Resuming, Self::Running)
                | (Self::Running, Self::Drained)
                | (Self::Drained, Self::Committed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Resuming => "resuming",
            Self::Running => "running",
            Self::Drained => "drained",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_states() {
        assert!(BuildState::Fresh.is_initial());
        assert!(BuildState::Resuming.is_initial());

        assert!(!BuildState::Running.is_initial());
        assert!(!BuildState::Drained.is_initial());
        assert!(!BuildState::Committed.is_initial());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(BuildState::Fresh.can_transition_to(BuildState::Running));
        assert!(BuildState::Resuming.can_transition_to(BuildState::Running));
        assert!(BuildState::Running.can_transition_to(BuildState::Drained));
        assert!(BuildState::Drained.can_transition_to(BuildState::Committed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!BuildState::Fresh.can_transition_to(BuildState::Committed));
        assert!(!BuildState::Running.can_transition_to(BuildState::Committed));
        assert!(!BuildState::Drained.can_transition_to(BuildState::Running));
        assert!(!BuildState::Committed.can_transition_to(BuildState::Fresh));
        assert!(!BuildState::Running.can_transition_to(BuildState::Running));
    }

    #[test]
    fn test_only_committed_is_terminal() {
        assert!(BuildState::Committed.is_terminal());
        assert!(!BuildState::Drained.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", BuildState::Resuming), "resuming");
        assert_eq!(format!("{}", BuildState::Committed), "committed");
    }
}
