//! Log capture for tests that assert on emitted events.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::subscriber::DefaultGuard;
use tracing::Level;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures every event at `debug` and above on the current thread until
/// dropped.
pub(crate) struct CapturedLogs {
    buf: SharedBuf,
    _guard: DefaultGuard,
}

impl CapturedLogs {
    pub(crate) fn install() -> Self {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self { buf, _guard: guard }
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let bytes = self
            .buf
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Number of `WARN` events.
    pub(crate) fn warnings(&self) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.trim_start().starts_with("WARN"))
            .count()
    }

    pub(crate) fn warnings_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.trim_start().starts_with("WARN") && line.contains(needle))
            .count()
    }
}
