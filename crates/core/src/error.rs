use thiserror::Error;

use crate::model::{ActorParseError, AssignmentError, KidError, RoutineError, SessionError};
use crate::permissions::ParseCapabilityError;
use crate::time::DateRangeError;

/// Umbrella error for callers that do not need to distinguish domain failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Actor(#[from] ActorParseError),
    #[error(transparent)]
    Capability(#[from] ParseCapabilityError),
    #[error(transparent)]
    Routine(#[from] RoutineError),
    #[error(transparent)]
    Kid(#[from] KidError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    DateRange(#[from] DateRangeError),
}
