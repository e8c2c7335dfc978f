//! Error types of the workers and the supervisor.

use asm_common::config::ConfigError;
use asm_common::hal::HalError;
use asm_lora::LoraError;
use thiserror::Error;

/// Failure while starting a worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The LoRa driver rejected an operation.
    #[error("radio: {0}")]
    Radio(#[from] LoraError),

    /// A device could not be opened or did not answer.
    #[error("hardware: {0}")]
    Hardware(#[from] HalError),

    /// The worker thread could not be created.
    #[error("failed to spawn thread: {0}")]
    Spawn(String),
}

/// Fatal supervisor error. Every variant aborts startup.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Host or machine configuration is missing or invalid.
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// A worker failed to start.
    #[error("{name} worker: {source}")]
    Worker {
        /// Worker name.
        name: &'static str,
        /// Underlying failure.
        #[source]
        source: WorkerError,
    },

    /// A board device could not be set up.
    #[error("board: {0}")]
    Board(#[source] HalError),

    /// The display could not be initialised.
    #[error("display: {0}")]
    Display(#[source] HalError),

    /// The initial page refused to load.
    #[error("page '{0}' failed to load")]
    PageRejected(String),

    /// `start` was called twice.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// `run` was called before a successful `start`.
    #[error("supervisor not started")]
    NotStarted,
}

impl SupervisorError {
    /// Wrap a worker start failure.
    pub fn worker(name: &'static str, source: WorkerError) -> Self {
        SupervisorError::Worker { name, source }
    }
}
