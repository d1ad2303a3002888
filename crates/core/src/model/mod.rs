mod actor;
mod assignment;
mod ids;
mod kid;
mod routine;
mod session;

pub use actor::{Actor, ActorKind, ActorParseError, Tier};
pub use assignment::{Assignment, AssignmentError, AssignmentStatus};
pub use ids::{AssignmentId, ExerciseId, KidId, ParseIdError, RoutineId, TutorId};
pub use kid::{Kid, KidError};
pub use routine::{Difficulty, Exercise, Routine, RoutineAuthor, RoutineError};
pub use session::{ExerciseResult, SessionAction, SessionError, SessionState, TrainingSession};
