//! # Code Execution Service
//!
//! Orchestrates runs of arbitrary code snippets on a remote sandboxed provider and
//! delivers the outcome into a document's shared, append-only result log.
//!
//! A run is submitted once, polled at a fixed interval under a hard attempt
//! ceiling, and always ends in an [`ExecutionResult`], even when the provider is
//! unreachable or never settles.

mod document;
mod error;
mod poller;
mod presence;
mod provider;
mod registry;
mod service;
mod shared;
mod types;


pub use document::{
    DocumentHub, DocumentSettings, ResultLog, SharedDocument, EXECUTIONS_KEY, LANGUAGE_SETTING,
    SETTINGS_KEY,
};
pub use error::Error;
pub use poller::{normalize_status, poll_until_settled, PollPolicy};
pub use presence::{anonymous_user_id, user_color, ANONYMOUS_COLOR};
pub use provider::ExecutionProvider;
pub use registry::{
    supported_languages, to_language_id, to_runtime_id, Language, LanguageInfo, DEFAULT_LANGUAGE,
};
pub use service::CodeExecutionService;
pub use shared::{
    InMemoryMap, InMemorySequence, MapChange, Observer, ObserverId, SequenceChange, SharedMap,
    SharedSequence,
};
pub use types::{ExecutionRequest, ExecutionResult, ExecutionStatus};

pub use tokio_util::sync::CancellationToken;

/// Result type for code execution operations
pub type Result<T> = std::result::Result<T, Error>;
