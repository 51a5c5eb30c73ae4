use core::fmt;

use async_trait::async_trait;
use log::{error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::Sender;

use super::errors::ImporterError;

/// Longest line kept in memory. Anything past it is discarded up to the next newline.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

#[async_trait]
pub trait Import: Send {
    /// Next raw line, `None` once the stream is closed.
    async fn import(&mut self) -> Result<Option<String>, ImporterError>;
}

/// Line-oriented importer over any buffered async reader.
///
/// Lines are decoded lossily, so bytes that are not valid UTF-8 never stop the stream.
pub struct LineImporter<R> {
    reader: R,
    buffer: Vec<u8>,
    source: String,
}

impl<R> fmt::Debug for LineImporter<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LineImporter {{ source: {} }}", self.source)
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineImporter<R> {
    pub fn new(reader: R, source: &str) -> Self {
        LineImporter {
            reader,
            buffer: Vec::new(),
            source: source.to_owned(),
        }
    }

    /// Fills `buffer` with the next line, newline included when present.
    /// Returns whether the line was cut at `MAX_LINE_LENGTH`.
    async fn read_line(&mut self) -> std::io::Result<bool> {
        self.buffer.clear();
        let mut truncated = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(truncated);
            }

            let (chunk, complete) = match available.iter().position(|b| *b == b'\n') {
                Some(end) => (&available[..=end], true),
                None => (available, false),
            };

            let room = MAX_LINE_LENGTH.saturating_sub(self.buffer.len());
            if chunk.len() > room {
                truncated = true;
            }
            self.buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let consumed = chunk.len();
            self.reader.consume(consumed);

            if complete {
                return Ok(truncated);
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Import for LineImporter<R> {
    async fn import(&mut self) -> Result<Option<String>, ImporterError> {
        let truncated = self.read_line().await?;
        if self.buffer.is_empty() && !truncated {
            return Ok(None);
        }
        if truncated {
            warn!(
                "{}: line longer than {} bytes, truncated",
                self.source, MAX_LINE_LENGTH
            );
        }

        let mut line: &[u8] = &self.buffer;
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
        }

        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

/// Pumps lines into the channel in order until the stream closes or fails.
pub async fn run(mut importer: Box<dyn Import>, tx: Sender<String>) {
    info!("Spawned importer...");

    loop {
        match importer.import().await {
            Ok(Some(line)) => {
                if let Err(e) = tx.send(line).await {
                    error!("unable to send imported line to the ingestion channel: {:?}", e);
                    break;
                }
            }
            Ok(None) => {
                info!("input stream closed");
                break;
            }
            Err(e) => {
                error!("unable to read input stream: {:?}", e);
                break;
            }
        }
    }

    info!("Closing importer...");
}
