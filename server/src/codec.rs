//! Line framing for the TCP transport
//!
//! One JSON message per `\n` terminated line in each direction. Incoming
//! lines are capped at [`MAX_LINE_LENGTH`] bytes so a peer cannot make the
//! server buffer an unbounded line.

use crate::error::{ProtocolError, ServerError};
use futures::StreamExt;
use shared::protocol::{decode_line, encode_line};
use shared::{ClientMessage, ServerMessage};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

/// Longest accepted incoming line, in bytes, without the newline
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

pub struct MessageReader<R> {
    lines: FramedRead<R, LinesCodec>,
    max_length: usize,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_length(reader, MAX_LINE_LENGTH)
    }

    pub fn with_max_length(reader: R, max_length: usize) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(max_length)),
            max_length,
        }
    }

    /// Reads the next client message, skipping blank lines
    ///
    /// Returns `Ok(None)` when the peer closed the connection. Cancel safe, so
    /// it can sit in a `select!` next to the outbound queue.
    pub async fn read_message(&mut self) -> Result<Option<ClientMessage>, ServerError> {
        while let Some(line) = self.lines.next().await {
            let line = line.map_err(|e| self.line_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            return decode_line(&line)
                .map(Some)
                .map_err(|e| ProtocolError::Malformed(e).into());
        }
        Ok(None)
    }

    fn line_error(&self, err: LinesCodecError) -> ServerError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ProtocolError::LineTooLong {
                max: self.max_length,
            }
            .into(),
            LinesCodecError::Io(e) if e.kind() == ErrorKind::InvalidData => {
                ProtocolError::InvalidUtf8.into()
            }
            LinesCodecError::Io(e) => ServerError::Io(e),
        }
    }
}

pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn send(&mut self, message: &ServerMessage) -> Result<(), ServerError> {
        let line = encode_line(message).map_err(ServerError::Encode)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
