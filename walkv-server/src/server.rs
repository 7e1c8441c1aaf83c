//! TCP server implementation.

use crate::error::ServerError;
use crate::handler::CommandHandler;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use walkv_protocol::{Command, Frame, Reply};
use walkv_storage::KeyValueStore;

/// TCP server for walkv.
///
/// One task per connection; each connection reads framed commands,
/// dispatches them against the shared store, and writes framed replies.
pub struct Server {
    listener: TcpListener,
    handler: Arc<CommandHandler>,
    shutdown: broadcast::Sender<()>,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(
        bind_addr: SocketAddr,
        store: Arc<KeyValueStore>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(bind_addr).await?;
        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            listener,
            handler: Arc::new(CommandHandler::new(store)),
            shutdown,
        })
    }

    /// The actually bound address (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until [`Server::shutdown`] is called.
    pub async fn run(&self) -> Result<(), ServerError> {
        tracing::info!("listening on {}", self.listener.local_addr()?);
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!("client connected: {}", peer);

                    let handler = self.handler.clone();
                    let shutdown_rx = self.shutdown.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler, shutdown_rx).await {
                            tracing::debug!("connection {} ended with error: {}", peer, e);
                        }
                        tracing::debug!("client disconnected: {}", peer);
                    });
                }
            }
        }

        tracing::info!("server stopped accepting connections");
        Ok(())
    }

    /// Signals the accept loop and all connections to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    handler: Arc<CommandHandler>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        while let Some(frame) = Frame::decode(&mut buf)? {
            let (reply, quit) = match frame.to_json::<Command>() {
                Ok(command) => {
                    let quit = matches!(command, Command::Quit);
                    (handler.dispatch(command), quit)
                }
                // A malformed command fails that request, not the
                // connection: unknown verbs and missing fields both land
                // here via serde.
                Err(e) => (Reply::error(format!("invalid command: {}", e)), false),
            };

            let out = Frame::from_json(&reply)?.encode()?;
            stream.write_all(&out).await?;

            if quit {
                return Ok(());
            }
        }

        tokio::select! {
            _ = shutdown.recv() => return Ok(()),
            read = stream.read_buf(&mut buf) => {
                if read? == 0 {
                    return Ok(()); // peer closed
                }
            }
        }
    }
}
