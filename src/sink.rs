use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Any destination a logger can write lines to.
pub type BoxedWriter = Box<dyn Write + Send>;

/// The logger's current output, shared by the writer and the rotation manager.
///
/// The writer holds the lock for the duration of one line, and rotation swaps
/// the writer under the same lock. A line is therefore written entirely to one
/// destination, and a replaced destination is never written to again.
#[derive(Clone)]
pub struct ActiveSink {
    inner: Arc<Mutex<BoxedWriter>>,
}

impl ActiveSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::from_boxed(Box::new(writer))
    }

    pub fn from_boxed(writer: BoxedWriter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn write_line(&self, line: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(line)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }

    /// Install `next` and hand back the previous destination.
    ///
    /// The previous writer is flushed before it is released; the caller closes
    /// it by dropping it.
    pub fn replace(&self, next: BoxedWriter) -> BoxedWriter {
        let mut guard = self.inner.lock();
        let _ = guard.flush();
        std::mem::replace(&mut *guard, next)
    }
}

impl std::fmt::Debug for ActiveSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSink").finish_non_exhaustive()
    }
}

/// In-memory sink whose contents stay readable through any clone.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
