//! Errors raised while encoding or decoding eraser protocol messages.

/// Failure to move an `EraserCommand` or `EngineToUi` across the UI bridge.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Eraser message is not valid JSON for the protocol: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Malformed eraser message: {0}")]
    InvalidFormat(String),
}
