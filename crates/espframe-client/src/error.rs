//! Error types for the device client.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised before a device reply is available.
///
/// A reply from the device is never an error here, whatever its status or
/// body. Only failing to obtain one is.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured device address is not a usable HTTP URL.
    #[error("Invalid device address '{url}': {reason}")]
    InvalidAddress { url: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connecting, sending or reading the reply failed.
    #[error("Failed to send to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
