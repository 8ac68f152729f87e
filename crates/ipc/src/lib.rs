//! IPC message protocol for voxview
//!
//! Defines the messages exchanged between the UI shell and the volume
//! engine: eraser commands going in, edit notifications coming out.

mod commands;
mod error;
mod messages;

pub use commands::*;
pub use error::IpcError;
pub use messages::*;

use serde::{Serialize, de::DeserializeOwned};

/// Encode a message as JSON for the UI bridge.
pub fn to_json<T: Serialize>(message: &T) -> Result<String, IpcError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a JSON message coming from the UI bridge.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, IpcError> {
    if json.trim().is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(json)?)
}
