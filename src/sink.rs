use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination of the extracted payloads, keyed by transaction id.
pub trait PayloadSink {
    fn append(&self, txid: &str, payload: &str) -> anyhow::Result<()>;
}

/// Writes each transaction's payloads to `<dir>/<txid>.txt`, one line each.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self, txid: &str) -> PathBuf {
        self.dir.join(format!("{txid}.txt"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PayloadSink for FileSink {
    fn append(&self, txid: &str, payload: &str) -> anyhow::Result<()> {
        let path = self.path(txid);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        writeln!(file, "{payload}").with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }
}
