use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::{Channel, Connector};
use crate::{DashTransportError, FeedConfig};

/// Largest payload the 4-byte length prefix can describe.
const MAX_PREFIXED_LEN: usize = u32::MAX as usize;

/// Big-endian length prefix for a payload of `len` bytes.
fn length_prefix(len: usize) -> Result<[u8; 4], DashTransportError> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| DashTransportError::FrameTooLarge {
            size: len,
            max: MAX_PREFIXED_LEN,
        })
}

/// Write a length-prefixed frame (4-byte big-endian length, then payload).
pub(crate) async fn write_framed<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), DashTransportError> {
    let len = length_prefix(data.len())?;
    async {
        writer.write_all(&len).await?;
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await
    .map_err(DashTransportError::Send)
}

/// Read one length-prefixed frame. `Ok(None)` on a clean EOF.
pub(crate) async fn read_framed<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_size: usize,
) -> Result<Option<Vec<u8>>, DashTransportError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(DashTransportError::Receive(e)),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_size {
        return Err(DashTransportError::FrameTooLarge {
            size: len,
            max: max_size,
        });
    }

    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(DashTransportError::Receive)?;

    Ok(Some(buf))
}

/// Dials the feed over TCP with length-prefixed framing.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Duration,
    max_frame_size: usize,
    recv_buffer: usize,
}

impl TcpConnector {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            addr: config.addr.clone(),
            connect_timeout: config.connect_timeout,
            max_frame_size: config.max_frame_size,
            recv_buffer: config.recv_buffer,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn connect(&self) -> Result<TcpChannel, DashTransportError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| DashTransportError::ConnectTimeout {
                addr: self.addr.clone(),
                timeout: self.connect_timeout,
            })?
            .map_err(|source| DashTransportError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        let _ = stream.set_nodelay(true);

        tracing::debug!(addr = %self.addr, "feed connected");
        Ok(TcpChannel::spawn(stream, self.max_frame_size, self.recv_buffer))
    }
}

/// An established TCP feed connection.
///
/// A background task owns the read half and forwards whole frames over an
/// mpsc channel, which keeps [`Channel::recv`] cancel-safe.
pub struct TcpChannel {
    writer: OwnedWriteHalf,
    incoming_rx: mpsc::Receiver<Result<Vec<u8>, DashTransportError>>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl TcpChannel {
    fn spawn(stream: TcpStream, max_frame_size: usize, recv_buffer: usize) -> Self {
        let (mut read_half, writer) = stream.into_split();
        let (incoming_tx, incoming_rx) = mpsc::channel(recv_buffer);

        let reader = tokio::spawn(async move {
            loop {
                match read_framed(&mut read_half, max_frame_size).await {
                    Ok(Some(frame)) => {
                        if incoming_tx.send(Ok(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = incoming_tx.send(Err(e)).await;
                        break;
                    }
                }
            }
        });

        Self {
            writer,
            incoming_rx,
            reader,
            closed: false,
        }
    }
}

#[async_trait::async_trait]
impl Channel for TcpChannel {
    async fn send(&mut self, data: &[u8]) -> Result<(), DashTransportError> {
        if self.closed {
            return Err(DashTransportError::Closed);
        }
        write_framed(&mut self.writer, data).await
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, DashTransportError> {
        match self.incoming_rx.recv().await {
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.writer.shutdown().await;
        self.reader.abort();
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn framing_round_trip_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_framed(&mut a, b"hello").await.unwrap();
        write_framed(&mut a, b"").await.unwrap();
        drop(a);

        assert_eq!(read_framed(&mut b, 1024).await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(read_framed(&mut b, 1024).await.unwrap(), Some(Vec::new()));
        assert_eq!(read_framed(&mut b, 1024).await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(256);
        write_framed(&mut a, &[7u8; 128]).await.unwrap();

        match read_framed(&mut b, 64).await {
            Err(DashTransportError::FrameTooLarge { size, max }) => {
                assert_eq!(size, 128);
                assert_eq!(max, 64);
            }
            other => panic!("expected FrameTooLarge, got: {other:?}"),
        }
    }

    #[test]
    fn length_prefix_is_big_endian() {
        assert_eq!(length_prefix(0x0102).unwrap(), [0, 0, 1, 2]);
        assert_eq!(length_prefix(MAX_PREFIXED_LEN).unwrap(), [0xff; 4]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn length_beyond_prefix_range_is_too_large() {
        match length_prefix(MAX_PREFIXED_LEN + 1) {
            Err(DashTransportError::FrameTooLarge { size, max }) => {
                assert_eq!(size, MAX_PREFIXED_LEN + 1);
                assert_eq!(max, MAX_PREFIXED_LEN);
            }
            other => panic!("expected FrameTooLarge, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_payload_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(&10u32.to_be_bytes()).await.unwrap();
        a.write_all(b"abc").await.unwrap();
        drop(a);

        assert!(matches!(
            read_framed(&mut b, 1024).await,
            Err(DashTransportError::Receive(_))
        ));
    }
}
