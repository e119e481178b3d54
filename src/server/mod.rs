pub mod context;
pub mod handlers;
pub mod http;
pub mod protocol;

pub use context::{run_blocking, AppContext, AppError};
pub use http::{build_router, run_server};
