//! Concurrent draining of the daemon's stdout and stderr
//!
//! Each output channel gets its own task that reads until end-of-stream.
//! Lines from both tasks are pushed into a single channel, in production
//! order per stream, with no ordering between the two streams.

use crate::vpn::{OutputLine, StreamSource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of lines kept for the exit summary
pub const TRAILING_CAPACITY: usize = 4;

/// The most recent output lines, oldest first
#[derive(Debug, Clone, Default)]
pub struct TrailingBuffer {
    lines: VecDeque<String>,
}

impl TrailingBuffer {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(TRAILING_CAPACITY),
        }
    }

    /// Append a line, evicting the oldest one when full
    pub fn push(&mut self, line: String) {
        if self.lines.len() == TRAILING_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// Trailing buffer shared by the two drain tasks and the exit watcher
pub type SharedTrailingBuffer = Arc<Mutex<TrailingBuffer>>;

/// Settings shared by both drain tasks of one process
#[derive(Clone)]
pub struct StreamDrain {
    name: Arc<str>,
    verbose: bool,
    trailing: SharedTrailingBuffer,
    line_sender: mpsc::UnboundedSender<OutputLine>,
}

impl StreamDrain {
    /// Create a drain for the daemon called `name`
    ///
    /// Every line is forwarded to `line_sender`.
    pub fn new(
        name: impl Into<Arc<str>>,
        verbose: bool,
        line_sender: mpsc::UnboundedSender<OutputLine>,
    ) -> Self {
        Self {
            name: name.into(),
            verbose,
            trailing: Arc::new(Mutex::new(TrailingBuffer::new())),
            line_sender,
        }
    }

    /// Handle to the trailing buffer, read once the process has exited
    pub fn trailing(&self) -> SharedTrailingBuffer {
        Arc::clone(&self.trailing)
    }

    /// Spawn a task draining `reader` until end-of-stream
    pub fn spawn<R>(&self, source: StreamSource, reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let drain = self.clone();
        tokio::spawn(async move { drain.run(source, reader).await })
    }

    async fn run<R>(self, source: StreamSource, reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut segments = BufReader::new(reader).split(b'\n');
        let mut observer_gone = false;

        loop {
            let segment = match segments.next_segment().await {
                Ok(Some(segment)) => segment,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("{} {} read error: {}", self.name, source, e);
                    break;
                }
            };

            let text = String::from_utf8_lossy(&segment);
            let text = text.trim_end();
            if text.is_empty() {
                continue;
            }

            self.record(source, text);

            // Keep reading after the receiver is gone so the daemon never
            // blocks on a full pipe.
            if !observer_gone
                && self
                    .line_sender
                    .send(OutputLine::new(source, text))
                    .is_err()
            {
                tracing::debug!("{} output receiver dropped, discarding lines", self.name);
                observer_gone = true;
            }
        }

        tracing::debug!("{} {} reached end of stream", self.name, source);
    }

    fn record(&self, source: StreamSource, text: &str) {
        if let Ok(mut trailing) = self.trailing.lock() {
            trailing.push(text.to_string());
        }

        if self.verbose {
            tracing::info!("{} {}: {}", self.name, source, text);
        } else {
            tracing::debug!("{} {}: {}", self.name, source, text);
        }
    }
}
