use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::core::traits::reader::OutputReader;

/// Drains one subprocess stream line by line into a fixed list of readers.
///
/// The stream itself is only handed over in [`StreamPump::drain`], so a pump
/// can be wired up before the process exists.
pub struct StreamPump<'a> {
    stream_name: &'static str,
    readers: Vec<&'a mut dyn OutputReader>,
}

impl<'a> StreamPump<'a> {
    pub fn new(stream_name: &'static str, readers: Vec<&'a mut dyn OutputReader>) -> Self {
        Self {
            stream_name,
            readers,
        }
    }

    /// Reads until end-of-stream or the first I/O error and returns the
    /// number of dispatched lines. Both endings count as normal termination.
    ///
    /// Invalid UTF-8 is replaced rather than treated as an error, so the
    /// pipe keeps being drained.
    pub async fn drain<R>(mut self, stream: R) -> usize
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let mut lines = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buf));
                    self.dispatch(&line);
                    lines += 1;
                }
                Err(err) => {
                    tracing::warn!(stream = self.stream_name, "Failed to read line: {}", err);
                    break;
                }
            }
        }

        tracing::trace!(stream = self.stream_name, lines, "Stream closed");
        lines
    }

    fn dispatch(&mut self, line: &str) {
        for reader in self.readers.iter_mut() {
            if let Err(err) = reader.read_output(line) {
                tracing::trace!(stream = self.stream_name, "Reader rejected line: {}", err);
            }
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
