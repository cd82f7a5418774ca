//! One client connection: greeting, then a request/reply line loop.

use anyhow::Result;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::command::Command;
use crate::reply::Reply;
use atomkv_core::store::Store;

pub struct Connection {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: BufWriter<tokio::net::tcp::OwnedWriteHalf>,
    peer_addr: SocketAddr,
    store: Store,
    read_timeout: Duration,
}

impl Connection {
    pub fn new(
        socket: TcpStream,
        peer_addr: SocketAddr,
        store: Store,
        read_timeout_secs: u64,
    ) -> Self {
        let (reader, writer) = socket.into_split();
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            peer_addr,
            store,
            read_timeout: Duration::from_secs(read_timeout_secs),
        }
    }

    /// Greet the client, then answer one request per line until the peer
    /// goes away. Returns the number of requests answered.
    pub async fn handle(&mut self) -> Result<u64> {
        let conn_span = info_span!(
            "connection",
            peer = %self.peer_addr,
        );

        async {
            info!("connection established");

            self.writer.write_all(b"OK AtomKV\n").await?;
            self.writer.flush().await?;

            let mut served = 0u64;
            let mut line = String::new();
            loop {
                line.clear();
                match timeout(self.read_timeout, self.reader.read_line(&mut line)).await {
                    Ok(Ok(0)) => {
                        debug!("client disconnected");
                        break;
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        // Transport failures close the connection silently
                        debug!(error = %e, "socket read failed");
                        break;
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = self.read_timeout.as_secs(),
                            "read timeout exceeded"
                        );
                        break;
                    }
                }

                let request = line.trim();
                if request.is_empty() {
                    continue;
                }

                match Command::parse(request) {
                    Ok(cmd) => {
                        let start = Instant::now();
                        let reply = cmd.execute(&self.store).await;
                        debug!(
                            command = cmd.name(),
                            latency_us = start.elapsed().as_micros() as u64,
                            "command executed"
                        );
                        self.write_reply(&reply).await?;
                        served += 1;
                        if cmd.is_quit() {
                            break;
                        }
                    }
                    Err(e) => {
                        self.write_reply(&Reply::Error(e.to_string())).await?;
                        served += 1;
                    }
                }
            }

            info!(served, "connection closed");
            Ok(served)
        }
        .instrument(conn_span)
        .await
    }

    async fn write_reply(&mut self, reply: &Reply) -> Result<()> {
        self.writer.write_all(reply.encode().as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
