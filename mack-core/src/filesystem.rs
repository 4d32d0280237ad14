use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::HostError;
use crate::native::{DialogGuard, DialogKind, DialogOptions, FileFilter, NativeDialogs};

pub const UNTITLED_FILE_NAME: &str = "untitled.txt";

/// A path and its text content, produced by open and consumed by save.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    pub path: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
    pub path: String,
}

/// Filters offered by both the open and the save dialog.
pub fn default_filters() -> Vec<FileFilter> {
    vec![
        FileFilter::new("Text Files", &["txt", "md"]),
        FileFilter::new("Code Files", &["py", "js", "html", "css"]),
        FileFilter::new("All Files", &["*"]),
    ]
}

/// Run a dialog on the blocking pool. The guard is dropped on that thread,
/// so the native dialog is released whatever the outcome.
async fn pick_path(
    dialogs: Arc<dyn NativeDialogs>,
    options: DialogOptions,
) -> Result<Option<PathBuf>, String> {
    tokio::task::spawn_blocking(move || {
        let mut guard = DialogGuard::open(dialogs.as_ref(), &options);
        guard.run().filter(|p| !p.as_os_str().is_empty())
    })
    .await
    .map_err(|e| format!("Dialog task failed: {}", e))
}

/// Ask the user for a file and read it as UTF-8.
///
/// I/O always uses the path the dialog returned; the payload carries a
/// lossy UTF-8 rendering of it.
///
/// Returns `Ok(None)` if the dialog is cancelled. A read failure is logged
/// and reported as [`HostError::OpenFailed`] without any partial content.
pub async fn open_file(dialogs: Arc<dyn NativeDialogs>) -> Result<Option<FileHandle>, HostError> {
    let options = DialogOptions {
        kind: DialogKind::Open,
        filters: default_filters(),
    };
    let picked = pick_path(dialogs, options).await.map_err(|e| {
        log::error!("File open error: {}", e);
        HostError::OpenFailed
    })?;
    let Some(path) = picked else {
        return Ok(None);
    };

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Some(FileHandle {
            path: path.to_string_lossy().to_string(),
            content,
        })),
        Err(e) => {
            log::error!("File open error for {}: {}", path.display(), e);
            Err(HostError::OpenFailed)
        }
    }
}

/// Ask the user where to save `request.content` and write it there.
///
/// Returns `Ok(None)` without touching the filesystem if the dialog is
/// cancelled.
pub async fn save_file(
    dialogs: Arc<dyn NativeDialogs>,
    request: SaveRequest,
) -> Result<Option<SavedFile>, HostError> {
    let default_path = request
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| UNTITLED_FILE_NAME.to_string());
    let options = DialogOptions {
        kind: DialogKind::Save { default_path },
        filters: default_filters(),
    };
    let picked = pick_path(dialogs, options).await.map_err(|e| {
        log::error!("File save error: {}", e);
        HostError::SaveFailed
    })?;
    let Some(path) = picked else {
        return Ok(None);
    };

    match tokio::fs::write(&path, request.content.as_bytes()).await {
        Ok(()) => {
            log::info!("Saved {} bytes to {}", request.content.len(), path.display());
            Ok(Some(SavedFile {
                path: path.to_string_lossy().to_string(),
            }))
        }
        Err(e) => {
            log::error!("File save error for {}: {}", path.display(), e);
            Err(HostError::SaveFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::DialogWindow;
    use parking_lot::Mutex;

    /// Dialog stub that answers with a fixed path and records what it saw.
    struct FixedDialogs {
        answer: Option<PathBuf>,
        seen: Mutex<Vec<DialogOptions>>,
        closes: Arc<Mutex<usize>>,
    }

    struct FixedDialog {
        answer: Option<PathBuf>,
        closes: Arc<Mutex<usize>>,
    }

    impl DialogWindow for FixedDialog {
        fn run(&mut self) -> Option<PathBuf> {
            self.answer.clone()
        }
        fn close(&mut self) {
            *self.closes.lock() += 1;
        }
    }

    impl NativeDialogs for FixedDialogs {
        fn create(&self, options: &DialogOptions) -> Box<dyn DialogWindow> {
            self.seen.lock().push(options.clone());
            Box::new(FixedDialog {
                answer: self.answer.clone(),
                closes: self.closes.clone(),
            })
        }
    }

    fn dialogs(answer: Option<PathBuf>) -> Arc<FixedDialogs> {
        Arc::new(FixedDialogs {
            answer,
            seen: Mutex::new(Vec::new()),
            closes: Arc::new(Mutex::new(0)),
        })
    }

    #[tokio::test]
    async fn open_reads_chosen_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let d = dialogs(Some(path.clone()));
        let handle = open_file(d.clone()).await.unwrap().unwrap();
        assert_eq!(handle.path, path.to_string_lossy());
        assert_eq!(handle.content, "hello");
        assert_eq!(*d.closes.lock(), 1);
        assert_eq!(d.seen.lock()[0].filters, default_filters());
    }

    #[tokio::test]
    async fn open_cancelled_returns_none() {
        let d = dialogs(None);
        assert_eq!(open_file(d.clone()).await, Ok(None));
        assert_eq!(*d.closes.lock(), 1);
    }

    #[tokio::test]
    async fn open_empty_path_counts_as_cancel() {
        let d = dialogs(Some(PathBuf::new()));
        assert_eq!(open_file(d).await, Ok(None));
    }

    #[tokio::test]
    async fn open_missing_file_fails_without_partial_result() {
        let dir = tempfile::tempdir().unwrap();
        let d = dialogs(Some(dir.path().join("missing.txt")));
        assert_eq!(open_file(d.clone()).await, Err(HostError::OpenFailed));
        assert_eq!(*d.closes.lock(), 1);
    }

    #[tokio::test]
    async fn save_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        let d = dialogs(Some(path.clone()));

        let saved = save_file(
            d.clone(),
            SaveRequest {
                path: Some("notes.md".to_string()),
                content: "x".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(saved.path, path.to_string_lossy());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
        assert_eq!(
            d.seen.lock()[0].kind,
            DialogKind::Save {
                default_path: "notes.md".to_string()
            }
        );
    }

    #[tokio::test]
    async fn save_defaults_to_untitled() {
        let d = dialogs(None);
        let request = SaveRequest {
            path: None,
            content: "x".to_string(),
        };
        assert_eq!(save_file(d.clone(), request).await, Ok(None));
        assert_eq!(
            d.seen.lock()[0].kind,
            DialogKind::Save {
                default_path: UNTITLED_FILE_NAME.to_string()
            }
        );
    }

    #[tokio::test]
    async fn save_cancelled_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let d = dialogs(None);
        let request = SaveRequest {
            path: Some(dir.path().join("a.txt").to_string_lossy().to_string()),
            content: "x".to_string(),
        };
        assert_eq!(save_file(d.clone(), request).await, Ok(None));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(*d.closes.lock(), 1);
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let d = dialogs(Some(dir.path().join("nope").join("a.txt")));
        let request = SaveRequest {
            path: None,
            content: "x".to_string(),
        };
        assert_eq!(save_file(d, request).await, Err(HostError::SaveFailed));
    }

    // ── Non-UTF-8 paths ──

    #[cfg(target_os = "linux")]
    fn latin1_path(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::ffi::OsStrExt;
        dir.join(std::ffi::OsStr::from_bytes(b"caf\xe9.txt"))
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn save_writes_the_chosen_non_utf8_path() {
        let dir = tempfile::tempdir().unwrap();
        let chosen = latin1_path(dir.path());
        let request = SaveRequest {
            path: None,
            content: "x".to_string(),
        };

        let saved = save_file(dialogs(Some(chosen.clone())), request)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(std::fs::read_to_string(&chosen).unwrap(), "x");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(saved.path, chosen.to_string_lossy());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn open_reads_the_chosen_non_utf8_path() {
        let dir = tempfile::tempdir().unwrap();
        let chosen = latin1_path(dir.path());
        std::fs::write(&chosen, "bonjour").unwrap();

        let handle = open_file(dialogs(Some(chosen))).await.unwrap().unwrap();
        assert_eq!(handle.content, "bonjour");
        assert!(handle.path.ends_with("caf\u{FFFD}.txt"));
    }

    #[test]
    fn save_request_path_is_optional() {
        let req: SaveRequest = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(req.path, None);
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"content":"x"}"#);
    }
}
