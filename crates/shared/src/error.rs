use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Precondition,
    TransientMissingData,
    Collaborator,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("control mode \"{mode}\" does not exist for {module}")]
    InvalidArgument { module: String, mode: String },
    #[error("module name '{0}' is used more than once")]
    DuplicateModule(String),
    #[error("module '{0}' is not part of this condition")]
    UnknownModule(String),
    #[error("condition '{condition}' already has a {slot} module")]
    SlotTaken { condition: String, slot: String },
    #[error("condition '{condition}' has no {slot} module")]
    MissingModule { condition: String, slot: String },
    #[error("transition '{event}' from '{from}' is defined more than once")]
    DuplicateTransition { event: String, from: String },
    #[error("state machine has no transitions")]
    EmptyStateMachine,
    #[error("session has no tasks")]
    EmptySession,
    #[error("transition '{event}' is not permitted from state '{state}'")]
    TransitionRejected { event: String, state: String },
    #[error("{0} is not loaded")]
    NotLoaded(String),
    #[error("goal pose already written by '{holder}' this frame")]
    GoalContended { holder: String },
    #[error("object '{0}' is not available")]
    MissingObject(String),
    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },
}

impl CoreError {
    pub fn invalid_mode(module: impl Into<String>, mode: impl Into<String>) -> Self {
        Self::InvalidArgument {
            module: module.into(),
            mode: mode.into(),
        }
    }

    pub fn rejected(event: impl Into<String>, state: impl Into<String>) -> Self {
        Self::TransitionRejected {
            event: event.into(),
            state: state.into(),
        }
    }

    pub fn collaborator(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::InvalidArgument { .. }
            | CoreError::DuplicateModule(_)
            | CoreError::UnknownModule(_)
            | CoreError::SlotTaken { .. }
            | CoreError::MissingModule { .. }
            | CoreError::DuplicateTransition { .. }
            | CoreError::EmptyStateMachine
            | CoreError::EmptySession => ErrorCategory::Configuration,
            CoreError::TransitionRejected { .. }
            | CoreError::NotLoaded(_)
            | CoreError::GoalContended { .. } => ErrorCategory::Precondition,
            CoreError::MissingObject(_) => ErrorCategory::TransientMissingData,
            CoreError::Collaborator { .. } => ErrorCategory::Collaborator,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.category() != ErrorCategory::Configuration
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal() {
        let err = CoreError::invalid_mode("drag-control", "grip-sometimes");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "control mode \"grip-sometimes\" does not exist for drag-control"
        );
    }

    #[test]
    fn rejected_transitions_are_recoverable() {
        let err = CoreError::rejected("previous", "0");
        assert_eq!(err.category(), ErrorCategory::Precondition);
        assert!(err.is_recoverable());
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::TransientMissingData).expect("json");
        assert_eq!(json, "\"transient_missing_data\"");
    }
}
