//! `docchat-server` exposes the docchat RAG pipeline and plain chat over HTTP.
//! Answers are returned as JSON or streamed as SSE.

pub mod config;
pub mod error;
pub mod providers;
pub mod server;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{ApiError, ApiJson};
pub use server::{AppState, app_router, run_server};
