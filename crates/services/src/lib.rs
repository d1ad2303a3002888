#![forbid(unsafe_code)]

pub mod app_services;
pub mod assignment_scheduler;
pub mod catalog_service;
pub mod error;
pub mod training;

pub use routine_core::Clock;

pub use app_services::AppServices;
pub use assignment_scheduler::AssignmentScheduler;
pub use catalog_service::CatalogService;
pub use error::{AppServicesError, Missing, SchedulerError, TrainingError};
pub use training::{DEFAULT_SESSION_KEY, SessionProgress, TrainingSessionManager};
