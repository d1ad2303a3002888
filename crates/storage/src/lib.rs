#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AssignmentRepository, InMemoryRepository, KidRepository, RoutineRepository, SessionStore,
    Storage, StorageError,
};
