//! Bridge for platform scanners that forward raw advertisements over TCP.
//!
//! A bridge opens a connection, sends `HELLO` and then streams one record per
//! advertisement:
//!
//! ```text
//! address(6) + rssi(1, signed) + name_len(1) + name(name_len) + len(1) + bytes(len)
//! ```
//!
//! Every connection is its own scan session.

use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use beacon_core::{Advertisement, DeviceAddress};
use tokio::{
    io::{self, AsyncRead, AsyncReadExt},
    net::TcpListener,
    sync::mpsc,
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use super::{ScanEvent, Scanner};

pub const HANDSHAKE: &[u8; 5] = b"HELLO";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Handshake failed: expected HELLO, got {0:?}")]
    HandshakeMismatch([u8; 5]),

    #[error("Device name is not valid UTF-8")]
    InvalidName(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal scan channel closed")]
    ChannelClosed,
}

pub struct TcpScanner {
    addr: SocketAddr,
}

impl TcpScanner {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl Scanner for TcpScanner {
    type Error = io::Error;

    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ScanEvent>, Self::Error> {
        let (tx, rx) = mpsc::channel(100);

        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "TCP scanner bridge listening");

        tokio::spawn(run_server_loop(listener, tx, cancel));

        Ok(rx)
    }
}

async fn run_server_loop(
    listener: TcpListener,
    tx: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Closing TCP scanner bridge");
                break;
            }
            client = listener.accept() => {
                match client {
                    Ok((stream, addr)) => {
                        info!(%addr, "Bridge connected");

                        let tx = tx.clone();
                        let cancel = cancel.clone();
                        tokio::spawn(async move {
                            let source = format!("tcp:{addr}");
                            if let Err(e) = handle_bridge(stream, source, tx, cancel).await {
                                error!(error = %e, "Bridge connection closed with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                        if is_transient_error(&e) {
                            sleep(Duration::from_millis(100)).await;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn is_transient_error(e: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(
        e.kind(),
        ConnectionRefused | ConnectionAborted | ConnectionReset | OutOfMemory | Other
    )
}

/// Runs one bridge session: handshake, then records until EOF or shutdown.
#[instrument(name = "bridge", skip(stream, tx, cancel))]
pub async fn handle_bridge<S>(
    mut stream: S,
    source: String,
    tx: mpsc::Sender<ScanEvent>,
    cancel: CancellationToken,
) -> Result<(), BridgeError>
where
    S: AsyncRead + Unpin,
{
    let mut hello = [0u8; 5];
    stream.read_exact(&mut hello).await?;

    if &hello != HANDSHAKE {
        return Err(BridgeError::HandshakeMismatch(hello));
    }

    tx.send(ScanEvent::SessionStarted {
        source: source.clone(),
    })
    .await
    .map_err(|_| BridgeError::ChannelClosed)?;
    info!("Handshake complete, scan session started");

    let result = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown signal received");
                break Ok(());
            }
            record = read_record(&mut stream) => {
                match record {
                    Ok(Some(adv)) => {
                        let event = ScanEvent::Advertisement {
                            source: source.clone(),
                            advertisement: adv,
                        };
                        if tx.send(event).await.is_err() {
                            break Err(BridgeError::ChannelClosed);
                        }
                    }
                    Ok(None) => {
                        info!("Bridge closed connection");
                        break Ok(());
                    }
                    Err(e) => break Err(e),
                }
            }
        }
    };

    let _ = tx.send(ScanEvent::SessionEnded { source }).await;

    result
}

/// Reads one record. `None` means the peer closed between records.
async fn read_record<S>(stream: &mut S) -> Result<Option<Advertisement>, BridgeError>
where
    S: AsyncRead + Unpin,
{
    let mut address = [0u8; 6];
    if stream.read(&mut address[..1]).await? == 0 {
        return Ok(None);
    }
    stream.read_exact(&mut address[1..]).await?;

    let rssi = stream.read_i8().await?;

    let name_len = stream.read_u8().await? as usize;
    let name = if name_len == 0 {
        None
    } else {
        let mut name = vec![0u8; name_len];
        stream.read_exact(&mut name).await?;
        Some(std::str::from_utf8(&name)?.into())
    };

    let len = stream.read_u8().await? as usize;
    let mut bytes = vec![0u8; len];
    stream.read_exact(&mut bytes).await?;

    Ok(Some(Advertisement {
        address: DeviceAddress(address),
        name,
        rssi: i16::from(rssi),
        bytes: bytes.into_boxed_slice(),
        received_at: jiff::Timestamp::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn record(address: [u8; 6], rssi: i8, name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut out = address.to_vec();
        out.push(rssi as u8);
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
        out
    }

    #[tokio::test]
    async fn streams_records_as_one_session() {
        let (mut client, server) = io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(handle_bridge(server, "test".into(), tx, cancel));

        client.write_all(HANDSHAKE).await.unwrap();
        client
            .write_all(&record([1, 2, 3, 4, 5, 6], -60, "GTI", &[0xAA; 27]))
            .await
            .unwrap();
        client
            .write_all(&record([1, 2, 3, 4, 5, 6], -61, "", &[0xBB; 4]))
            .await
            .unwrap();
        drop(client);

        assert!(matches!(
            rx.recv().await,
            Some(ScanEvent::SessionStarted { ref source }) if source == "test"
        ));

        match rx.recv().await {
            Some(ScanEvent::Advertisement {
                source,
                advertisement: adv,
            }) => {
                assert_eq!(source, "test");
                assert_eq!(adv.address, DeviceAddress([1, 2, 3, 4, 5, 6]));
                assert_eq!(adv.rssi, -60);
                assert_eq!(adv.name.as_deref(), Some("GTI"));
                assert_eq!(&adv.bytes[..], &[0xAA; 27]);
            }
            other => panic!("unexpected event {other:?}"),
        }

        match rx.recv().await {
            Some(ScanEvent::Advertisement {
                advertisement: adv, ..
            }) => {
                assert_eq!(adv.name, None);
                assert_eq!(adv.bytes.len(), 4);
            }
            other => panic!("unexpected event {other:?}"),
        }

        assert!(matches!(
            rx.recv().await,
            Some(ScanEvent::SessionEnded { .. })
        ));
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn rejects_bad_handshake() {
        let (mut client, server) = io::duplex(64);
        let (tx, mut rx) = mpsc::channel(16);

        client.write_all(b"HOLA!").await.unwrap();

        let result = handle_bridge(server, "test".into(), tx, CancellationToken::new()).await;
        assert!(matches!(result, Err(BridgeError::HandshakeMismatch(h)) if &h == b"HOLA!"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn truncated_record_is_an_error() {
        let (mut client, server) = io::duplex(64);
        let (tx, mut rx) = mpsc::channel(16);

        client.write_all(HANDSHAKE).await.unwrap();
        client.write_all(&[1, 2, 3]).await.unwrap();
        drop(client);

        let result = handle_bridge(server, "test".into(), tx, CancellationToken::new()).await;
        assert!(matches!(result, Err(BridgeError::Io(_))));

        assert!(matches!(
            rx.recv().await,
            Some(ScanEvent::SessionStarted { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(ScanEvent::SessionEnded { .. })
        ));
    }
}
