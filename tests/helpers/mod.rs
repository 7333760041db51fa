#![allow(dead_code)]

use std::io;
use std::thread;
use std::time::Duration;

use ssviewer::{Loader, MemoryLoader, Result};

/// An output buffer that accepts at most `capacity` bytes.
///
/// When full, `write` returns `Ok(0)` which `write_all` reports as
/// `io::ErrorKind::WriteZero`.
pub struct Buffer {
    bytes: Vec<u8>,
    capacity: usize,
    writes: usize,
}

impl Buffer {
    pub fn unbounded() -> Self {
        Self::with_capacity(usize::MAX)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
            writes: 0,
        }
    }

    /// Number of `write` calls that stored at least one byte.
    pub fn writes(&self) -> usize {
        self.writes
    }

    #[track_caller]
    pub fn contents(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.capacity - self.bytes.len());
        if n > 0 {
            self.bytes.extend_from_slice(&buf[..n]);
            self.writes += 1;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A loader that sleeps before every load.
pub struct SlowLoader {
    inner: MemoryLoader,
    delay: Duration,
}

impl SlowLoader {
    pub fn new(inner: MemoryLoader, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl Loader for SlowLoader {
    fn load(&self, path: &str) -> Result<String> {
        thread::sleep(self.delay);
        self.inner.load(path)
    }
}
