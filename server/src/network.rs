//! Server network layer: accepts TCP connections and hands each one its own session

use crate::session::{Session, SessionConfig, SessionEnd};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Listening side of the game server
///
/// The listener is the only thing the sessions have in common, and it is done
/// with a connection as soon as the connection is handed to its session task.
pub struct Server {
    listener: TcpListener,
    config: SessionConfig,
    next_session_id: u32,
}

impl Server {
    pub async fn bind(addr: &str, config: SessionConfig) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        info!(
            "Server listening on {} (board {}x{})",
            listener.local_addr()?,
            config.dim,
            config.dim
        );

        Ok(Server {
            listener,
            config,
            next_session_id: 1,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one task per connection.
    pub async fn run(mut self) -> Result<(), std::io::Error> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => self.spawn_session(stream, peer),
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    fn spawn_session(&mut self, stream: TcpStream, peer: SocketAddr) {
        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let session = match Session::new(session_id, &self.config) {
            Ok(session) => session,
            Err(e) => {
                error!("Refusing connection from {}: {}", peer, e);
                return;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle for {}: {}", peer, e);
        }

        info!("Session {} started for {}", session_id, peer);

        tokio::spawn(async move {
            match session.run(stream).await {
                Ok(SessionEnd::GameOver) => {
                    info!("Session {} ({}) finished: game over", session_id, peer)
                }
                Ok(SessionEnd::Disconnected) => {
                    info!("Session {} ({}) finished: client left", session_id, peer)
                }
                Err(e) => warn!("Session {} ({}) aborted: {}", session_id, peer, e),
            }
        });
    }
}
