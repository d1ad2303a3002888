mod manager;
mod progress;

// Public API of the training subsystem.
pub use crate::error::TrainingError;
pub use manager::{DEFAULT_SESSION_KEY, TrainingSessionManager};
pub use progress::SessionProgress;
