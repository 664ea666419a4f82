use crate::order::OrderStatus;

/// Input validation failures. These are terminal; the caller must fix the
/// request before retrying.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dream text is {len} characters, minimum is {min}")]
    DreamTextTooShort { len: usize, min: usize },
    #[error("interpretation is {len} characters, minimum is {min}")]
    InterpretationTooShort { len: usize, min: usize },
    #[error("clarification answer is {len} characters, minimum is {min}")]
    ClarificationAnswerTooShort { len: usize, min: usize },
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(u8),
    #[error("human order requires an interpreter id")]
    MissingInterpreter,
}

/// Domain and guard violations raised by the order lifecycle engine.
/// Callers should re-fetch state and present current status; these are
/// never retried automatically.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum OrderError {
    #[error("cannot {action} an order in state {from}")]
    InvalidTransition {
        from: OrderStatus,
        action: &'static str,
    },
    #[error("order is already completed")]
    AlreadyCompleted,
    #[error("order is already assigned")]
    AlreadyAssigned,
    #[error("caller is not the assigned interpreter")]
    NotAssignedInterpreter,
    #[error("caller is not the order requester")]
    NotRequester,
    #[error("a clarification was already requested for this order")]
    ClarificationAlreadyRequested,
    #[error("order has no pending clarification question")]
    NoPendingClarification,
    #[error("clarification was already answered")]
    ClarificationAlreadyAnswered,
    #[error("order was already rated")]
    AlreadyRated,
    #[error("caller is not an administrator")]
    NotAdmin,
    #[error("daily free interpretation already used, next free at {next_free_at}")]
    DailyFreeLimitReached { next_free_at: String },
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("interpreter not found: {0}")]
    InterpreterNotFound(String),
}

/// Bearer credential resolution failures. Always terminal, never retried.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing bearer credential")]
    MissingBearer,
    #[error("bearer credential could not be resolved")]
    InvalidBearer,
    #[error("insecure identity resolution is disabled")]
    InsecureResolverDisabled,
}
