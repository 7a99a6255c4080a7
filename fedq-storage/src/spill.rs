use crate::config::SpillConfig;
use crate::lob::{LobHandle, SpilledFile};
use bytes::Bytes;
use fedq_result::Result;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;

const SPILL_FILE_PREFIX: &str = "fedq-spill-";

/// Thread-safe counters describing sink activity for one store.
#[derive(Debug, Default)]
pub struct SpillStats {
    pub sinks_created: AtomicU64,
    pub sinks_spilled: AtomicU64,
    pub bytes_spilled: AtomicU64,
    pub handles_finished: AtomicU64,
}

impl SpillStats {
    /// Capture a point-in-time snapshot of the counters.
    pub fn snapshot(&self) -> SpillStatsSnapshot {
        SpillStatsSnapshot {
            sinks_created: self.sinks_created.load(Ordering::Relaxed),
            sinks_spilled: self.sinks_spilled.load(Ordering::Relaxed),
            bytes_spilled: self.bytes_spilled.load(Ordering::Relaxed),
            handles_finished: self.handles_finished.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpillStatsSnapshot {
    pub sinks_created: u64,
    pub sinks_spilled: u64,
    pub bytes_spilled: u64,
    pub handles_finished: u64,
}

/// Large-object staging store handing out spill-capable sinks.
#[derive(Clone, Debug, Default)]
pub struct LobStore {
    config: SpillConfig,
    stats: Arc<SpillStats>,
}

impl LobStore {
    pub fn new(config: SpillConfig) -> Self {
        Self {
            config,
            stats: Arc::new(SpillStats::default()),
        }
    }

    pub fn config(&self) -> &SpillConfig {
        &self.config
    }

    pub fn stats(&self) -> SpillStatsSnapshot {
        self.stats.snapshot()
    }

    /// Open a new empty sink governed by this store's configuration.
    pub fn create_sink(&self) -> SpillBuffer {
        self.stats.sinks_created.fetch_add(1, Ordering::Relaxed);
        SpillBuffer {
            threshold: self.config.memory_threshold,
            temp_dir: self.config.temp_dir.clone(),
            memory: Vec::new(),
            file: None,
            len: 0,
            stats: Arc::clone(&self.stats),
        }
    }
}

/// Append-only byte sink that moves to disk past a memory threshold.
///
/// Dropping the buffer without calling [`SpillBuffer::finish`] discards any
/// temp file it created.
#[derive(Debug)]
pub struct SpillBuffer {
    threshold: usize,
    temp_dir: Option<PathBuf>,
    memory: Vec<u8>,
    file: Option<BufWriter<NamedTempFile>>,
    len: u64,
    stats: Arc<SpillStats>,
}

impl SpillBuffer {
    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_spilled(&self) -> bool {
        self.file.is_some()
    }

    fn spill(&mut self) -> io::Result<()> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SPILL_FILE_PREFIX);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tracing::debug!(
            "spilling {} buffered bytes to {}",
            self.memory.len(),
            file.path().display()
        );
        let mut writer = BufWriter::new(file);
        writer.write_all(&self.memory)?;
        self.stats
            .bytes_spilled
            .fetch_add(self.memory.len() as u64, Ordering::Relaxed);
        self.stats.sinks_spilled.fetch_add(1, Ordering::Relaxed);
        self.memory = Vec::new();
        self.file = Some(writer);
        Ok(())
    }

    /// Seal the sink into an immutable handle.
    pub fn finish(mut self) -> Result<LobHandle> {
        self.stats.handles_finished.fetch_add(1, Ordering::Relaxed);
        match self.file.take() {
            None => Ok(LobHandle::Memory(Bytes::from(std::mem::take(
                &mut self.memory,
            )))),
            Some(writer) => {
                let file = writer.into_inner().map_err(|err| err.into_error())?;
                let path = file.into_temp_path();
                tracing::debug!(
                    "finished spilled large object of {} bytes at {}",
                    self.len,
                    path.display()
                );
                Ok(LobHandle::File(Arc::new(SpilledFile::new(path, self.len))))
            }
        }
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() && self.memory.len() + buf.len() > self.threshold {
            self.spill()?;
        }
        let written = match self.file.as_mut() {
            Some(writer) => {
                let n = writer.write(buf)?;
                self.stats
                    .bytes_spilled
                    .fetch_add(n as u64, Ordering::Relaxed);
                n
            }
            None => {
                self.memory.extend_from_slice(buf);
                buf.len()
            }
        };
        self.len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
