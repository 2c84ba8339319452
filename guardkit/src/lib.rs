// guardkit/src/lib.rs
//
// Shared building blocks for the faceguard door-access dashboard:
// wire types, the error taxonomy and configuration sections.

pub mod config;
pub mod errors;
pub mod types;

pub use errors::GuardError;
pub use types::{DoorAction, ImageRecord};
