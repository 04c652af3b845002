//! Warden Core — account model, shared error type, and the traits
//! implemented by persistence and notification collaborators.

pub mod error;
pub mod models;
pub mod notification;
pub mod repository;

pub use error::{WardenError, WardenResult};
