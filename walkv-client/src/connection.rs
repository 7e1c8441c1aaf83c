//! Framed connection to a walkv server.
//!
//! The protocol is strictly request/response on one connection, so the
//! connection owns the socket and a read buffer and exposes a single
//! blocking-style `request` method.

use crate::error::ClientError;
use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use walkv_protocol::{Command, Frame, Reply};

/// One TCP connection to the server.
pub struct Connection {
    stream: TcpStream,
    buf: BytesMut,
}

impl Connection {
    /// Connects to the server.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        tracing::debug!("connected to {}", addr);

        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(4096),
        })
    }

    /// Sends one command and waits for its reply.
    pub async fn request(&mut self, command: &Command) -> Result<Reply, ClientError> {
        let out = Frame::from_json(command)?.encode()?;
        self.stream.write_all(&out).await?;

        loop {
            if let Some(frame) = Frame::decode(&mut self.buf)? {
                return Ok(frame.to_json()?);
            }
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Minimal single-shot server: reads one framed command, answers with
    /// the canned reply, then closes.
    async fn one_shot_server(reply: Reply) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = BytesMut::new();
            loop {
                if let Some(frame) = Frame::decode(&mut buf).unwrap() {
                    let _: Command = frame.to_json().unwrap();
                    break;
                }
                stream.read_buf(&mut buf).await.unwrap();
            }
            let out = Frame::from_json(&reply).unwrap().encode().unwrap();
            stream.write_all(&out).await.unwrap();
        });

        addr
    }

    #[tokio::test]
    async fn test_request_reply_roundtrip() {
        let addr = one_shot_server(Reply::value(json!(7))).await;
        let mut conn = Connection::connect(addr).await.unwrap();

        let reply = conn
            .request(&Command::Get {
                key: "k".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(reply, Reply::value(json!(7)));
    }

    #[tokio::test]
    async fn test_closed_connection_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and immediately drop.
            let _ = listener.accept().await.unwrap();
        });

        let mut conn = Connection::connect(addr).await.unwrap();
        let result = conn.request(&Command::Keys).await;
        assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    }
}
