use nav_core::NavError;
use nav_protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed step: {source}")]
    Script {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {signal} has no pending sync to resolve")]
    NoPendingSync { line: usize, signal: String },

    #[error(transparent)]
    Nav(#[from] NavError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to write output: {0}")]
    Output(#[source] serde_json::Error),
}
