pub mod error;
pub mod filesystem;
pub mod native;
pub mod preferences;

pub use error::HostError;

/// Return the final path component for display, or the whole string when
/// there is none.
pub fn display_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
