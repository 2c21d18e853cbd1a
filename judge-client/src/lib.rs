//! # Judge Client
//!
//! Thin asynchronous client for a Judge0-compatible execution provider. Source code
//! is queued with `wait=false` and its outcome fetched with a separate status call,
//! leaving any polling policy to the caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use judge_client::{JudgeClient, JudgeConfig, RuntimeId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JudgeClient::new(JudgeConfig::from_env()?)?;
//!     let token = client.submit("print(\"hi\")", RuntimeId(71)).await?;
//!     let status = client.fetch_status(&token).await?;
//!
//!     println!("{}", status.status().description());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::JudgeClient;
pub use config::{JudgeConfig, API_KEY_ENV, DEFAULT_API_HOST, DEFAULT_API_URL};
pub use error::Error;
pub use types::*;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, Error>;
