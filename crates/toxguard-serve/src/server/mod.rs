pub mod app;
pub mod mock;
pub mod routes;

pub use app::*;
pub use mock::*;
