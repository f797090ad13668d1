//! Error types for the quizgrade core.
//!
//! Grading itself never fails. These errors come from the system boundary
//! (turning backend data into typed questions) and from the quiz session
//! state machine rejecting an illegal transition.

use thiserror::Error;

/// A backend question could not be turned into a [`crate::model::Question`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A multiple-choice question has no `answer_index`.
    #[error("question {id}: multiple-choice question has no answer index")]
    MissingAnswerIndex { id: String },

    /// The `answer_index` does not point at one of the choices.
    #[error("question {id}: answer index {index} out of range for {len} choice(s)")]
    AnswerIndexOutOfRange { id: String, index: usize, len: usize },

    /// A true/false question carries neither `answer` nor `expected`.
    #[error("question {id}: no expected answer")]
    MissingExpectedAnswer { id: String },

    /// A scenario question has no expected points.
    #[error("question {id}: scenario question has no steps")]
    MissingScenarioSteps { id: String },
}

/// The session state machine refused a transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The trigger is not valid in the current screen.
    #[error("cannot {action} from the {screen} screen")]
    InvalidTransition {
        action: &'static str,
        screen: &'static str,
    },

    /// A quiz was started with no questions.
    #[error("cannot start a quiz without questions")]
    EmptyQuiz,

    /// Two questions in one quiz share an id.
    #[error("duplicate question id '{id}' in quiz")]
    DuplicateQuestion { id: String },

    /// A blank response was submitted.
    #[error("answer must not be empty")]
    BlankAnswer,

    /// The admin panel requires an admin account.
    #[error("admin access required")]
    NotAdmin,

    /// The daily quiz was already completed within the cooldown window.
    #[error("daily quiz already completed, available again in {remaining_minutes} minute(s)")]
    DailyUnavailable { remaining_minutes: i64 },
}
