use thiserror::Error;

/// Failure surfaced to the view for a request/response operation.
///
/// The messages are deliberately generic; the underlying cause is logged on
/// the host side and never crosses the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Failed to open file")]
    OpenFailed,
    #[error("Failed to save file")]
    SaveFailed,
    #[error("Host is not available")]
    Unavailable,
}
