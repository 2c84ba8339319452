// services/guard-dash/src/lib.rs
//
// Face-recognition door-access dashboard - library exports
//

pub mod components;
pub mod config;
pub mod controller;
pub mod gallery;
pub mod source;
pub mod state;

pub use controller::Controller;
