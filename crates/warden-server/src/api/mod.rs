pub mod dto;
pub mod extract;
pub mod handlers;
pub mod routes;

pub use routes::{AppState, create_router};
