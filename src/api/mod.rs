pub mod handlers;
pub mod server;
pub mod types;

pub use server::{build_router, run};
pub use types::AppState;
