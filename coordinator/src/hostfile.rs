use std::{
    io,
    path::{Path, PathBuf},
};

use derive_more::Display;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

/// One hostfile line, without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{} slots={}", host, slots)]
pub struct HostEntry {
    pub host: String,
    pub slots: u32,
}

/// Append-only membership file shared by all connection handlers.
///
/// No handle is kept open between appends. Each append opens the file,
/// writes one whole line and closes it while holding `lock`, so lines from
/// concurrent handlers never interleave.
#[derive(Debug)]
pub struct Hostfile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Hostfile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &HostEntry) -> io::Result<()> {
        let line = format!("{entry}\n");

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        // tokio finishes writes in the background, wait for it before close
        file.flush().await?;
        Ok(())
    }
}
