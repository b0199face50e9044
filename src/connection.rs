//! Line transport to the controller.
//!
//! RIO runs over a plain TCP stream of carriage-return terminated ASCII
//! lines. [`Connection`] splits the stream into a writer task fed by an
//! unbounded channel and a reader task that reassembles inbound lines and
//! forwards them as [`ConnectionEvent`]s. The core never touches the socket:
//! it talks to the writer through the [`Transport`] trait, which tests
//! replace with a recording implementation.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::error::{Result, RioError};

/// TCP port the RIO service listens on
pub const DEFAULT_PORT: u16 = 9621;

/// Outbound half of the link as the core sees it
pub trait Transport: Send {
    /// Hand one command line to the link. The line is already CR-terminated.
    fn send(&mut self, line: &str) -> Result<()>;
}

/// Lifecycle and traffic events from a [`Connection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The TCP stream is established
    Connected,
    /// One complete inbound line, terminator stripped
    Line(String),
    /// The stream ended or failed; no further events will follow
    Disconnected,
}

/// Channel-backed [`Transport`] feeding the connection's writer task.
///
/// Cheap to clone; every clone feeds the same socket. Sending after the
/// writer task has gone away reports [`RioError::ConnectionClosed`].
#[derive(Debug, Clone)]
pub struct LineSender {
    tx: mpsc::UnboundedSender<String>,
}

impl Transport for LineSender {
    fn send(&mut self, line: &str) -> Result<()> {
        self.tx
            .send(line.to_string())
            .map_err(|_| RioError::ConnectionClosed)
    }
}

/// TCP connection to one controller system
pub struct Connection {
    line_tx: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl Connection {
    /// Connect to the controller at `host:port`.
    ///
    /// The standard RIO port is [`DEFAULT_PORT`]. The returned connection
    /// yields [`ConnectionEvent::Connected`] as its first event so a driver
    /// can treat the whole lifecycle as one event stream.
    pub async fn connect(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        tracing::info!(%host, port, "connecting");

        let stream = TcpStream::connect((host.as_str(), port)).await?;
        let (read, mut write) = stream.into_split();

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, events) = mpsc::unbounded_channel();

        // Writer task: drain outbound lines onto the socket.
        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                if let Err(err) = write.write_all(line.as_bytes()).await {
                    tracing::error!(%err, "send failed, closing writer");
                    break;
                }
            }
        });

        // Reader task: reassemble CR-terminated lines into events. The
        // controller sends bare CR; CRLF from simulators is tolerated.
        let _ = event_tx.send(ConnectionEvent::Connected);
        tokio::spawn(async move {
            let mut reader = BufReader::new(read);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\r', &mut buf).await {
                    Ok(0) => {
                        tracing::info!("connection closed by controller");
                        break;
                    }
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_matches(|c| c == '\r' || c == '\n');
                        if line.is_empty() {
                            continue;
                        }
                        tracing::debug!(line, "recv");
                        if event_tx.send(ConnectionEvent::Line(line.to_string())).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::error!(%err, "read failed");
                        break;
                    }
                }
            }
            let _ = event_tx.send(ConnectionEvent::Disconnected);
        });

        Ok(Self { line_tx, events })
    }

    /// Outbound handle for the core's transport collaborator
    pub fn sender(&self) -> LineSender {
        LineSender {
            tx: self.line_tx.clone(),
        }
    }

    /// Next connection event; `None` once the reader task is gone
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn send_after_close_reports_connection_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut sender = LineSender { tx };
        assert!(matches!(
            sender.send("GET C[1].Z[1].name\r"),
            Err(RioError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn frames_cr_terminated_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // One complete line, then one split across writes with a CRLF.
            socket
                .write_all(b"N C[1].Z[1].name=\"Kitchen\"\r")
                .await
                .unwrap();
            socket.write_all(b"N C[1].Z[2].na").await.unwrap();
            socket.write_all(b"me=\"Den\"\r\n").await.unwrap();

            let mut buf = [0u8; 19];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"WATCH C[1].Z[1] ON\r");
        });

        let mut connection = Connection::connect("127.0.0.1", addr.port()).await.unwrap();
        assert_eq!(
            connection.next_event().await,
            Some(ConnectionEvent::Connected)
        );

        let mut sender = connection.sender();
        sender.send("WATCH C[1].Z[1] ON\r").unwrap();

        assert_eq!(
            connection.next_event().await,
            Some(ConnectionEvent::Line("N C[1].Z[1].name=\"Kitchen\"".into()))
        );
        assert_eq!(
            connection.next_event().await,
            Some(ConnectionEvent::Line("N C[1].Z[2].name=\"Den\"".into()))
        );

        server.await.unwrap();
        assert_eq!(
            connection.next_event().await,
            Some(ConnectionEvent::Disconnected)
        );
    }
}
