// src/tasks/output.rs

//! Subprocess output plumbing.
//!
//! Child stdout/stderr are read line-by-line by two small reader tasks that
//! feed a single bounded channel. The caller owns the one consumer and
//! decides how lines are logged or matched; backpressure from a slow
//! consumer throttles the readers instead of growing an unbounded buffer.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Capacity of the per-child log line channel.
const LOG_CHANNEL_CAPACITY: usize = 256;

/// Which stdio stream a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdout,
    Stderr,
}

/// One line of child output, tagged with its stream of origin.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub stream: StdStream,
    pub text: String,
}

/// Take the stdio pipes off `child` and return the receiving end of a
/// bounded channel carrying every line either stream produces.
///
/// The channel closes once both streams reach EOF, which happens when the
/// child exits (or earlier if it closes its pipes). Dropping the receiver
/// stops the readers; the child itself is unaffected.
pub fn pump_lines(child: &mut Child) -> mpsc::Receiver<LogLine> {
    let (tx, rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);

    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, StdStream::Stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, StdStream::Stderr, tx);
    }

    rx
}

fn spawn_reader<R>(pipe: R, stream: StdStream, tx: mpsc::Sender<LogLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();
        while let Ok(Some(text)) = lines.next_line().await {
            if tx.send(LogLine { stream, text }).await.is_err() {
                // Consumer went away; stop reading.
                break;
            }
        }
    });
}
