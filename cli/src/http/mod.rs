//! HTTP控制面 - 将 enable/disable/status/list 映射到 StreamRegistry

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use models::*;
pub use server::*;
pub use state::*;
