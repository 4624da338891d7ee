//! Adapters for the external path optimizer.
//!
//! The optimizer is reached two ways: blocking HTTP calls that set up and
//! start a run (`client`), and a Socket.IO push channel carrying path
//! snapshots while the run progresses (`push` decodes frames, `listener`
//! keeps the WebSocket connected).

pub mod client;
pub mod command;
pub mod listener;
pub mod push;

pub use client::PlannerClient;
pub use command::{InitEnvironmentRequest, OptimizationParams, RunOptimizationRequest, RunStatus};
pub use push::{PushEvent, PushMessage};

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never got an answer.
    Network(String),
    /// The service answered with a non-success HTTP status.
    Rejected { status: u16, body: String },
    /// The answer could not be decoded.
    InvalidResponse(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Network(msg) => write!(f, "Network error: {}", msg),
            RemoteError::Rejected { status, body } => write!(f, "Optimizer rejected the request ({}): {}", status, body),
            RemoteError::InvalidResponse(msg) => write!(f, "Invalid response from optimizer: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// The remote calls the scene controller depends on.
///
/// Calls are synchronous and run to completion on the caller's thread.
pub trait RemotePlanner {
    fn init_environment(&self, request: &InitEnvironmentRequest) -> Result<(), RemoteError>;
    fn run_optimization(&self, request: &RunOptimizationRequest) -> Result<RunStatus, RemoteError>;
    fn stop_optimization(&self) -> Result<(), RemoteError>;
}
