//! Cabinet server library.

pub mod error;
pub mod files;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod scavenger;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use files::FileService;
pub use routes::create_router;
pub use scavenger::Scavenger;
pub use state::AppState;
