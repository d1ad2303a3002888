#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod permissions;
pub mod time;

pub use error::Error;
pub use permissions::{
    Capability, GateMode, Limit, PermissionGate, PermissionResolver, Permissions, Requirement,
};
pub use time::{Clock, DateRange};
