use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

pub type WriteFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'static>>;

/// Destination for rendered artifacts.
pub trait ReportSink: Send + Sync {
    /// Write `contents` to `path`, creating missing parent directories.
    fn write(&self, path: &Path, contents: Vec<u8>) -> WriteFuture;
}

/// Writes to the local filesystem through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl ReportSink for FsSink {
    fn write(&self, path: &Path, contents: Vec<u8>) -> WriteFuture {
        let path = path.to_path_buf();
        Box::pin(async move {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, contents).await
        })
    }
}

/// Keeps written files in memory. Paths listed in `fail_on` return an error instead.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    fail_on: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.fail_on.lock().unwrap().push(path.into());
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn get_string(&self, path: &Path) -> Option<String> {
        self.get(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportSink for MemorySink {
    fn write(&self, path: &Path, contents: Vec<u8>) -> WriteFuture {
        let path = path.to_path_buf();
        let files = Arc::clone(&self.files);
        let fail = self.fail_on.lock().unwrap().contains(&path);
        Box::pin(async move {
            if fail {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("refusing to write {}", path.display()),
                ));
            }
            files.lock().unwrap().insert(path, contents);
            Ok(())
        })
    }
}
