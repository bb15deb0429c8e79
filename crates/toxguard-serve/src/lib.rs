//! ToxGuard Serve
//!
//! HTTP front ends for the toxicity classifier:
//! - a comment form that scores one submission and renders the result page
//! - a stub prediction endpoint used to exercise the replay client

pub mod cli;
pub mod error;
pub mod page;
pub mod server;
pub mod state;

pub use error::AppError;
pub use server::{build_form_app, build_mock_app, run_server};
pub use state::AppState;
