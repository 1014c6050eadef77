//! TCP transport for DNS queries.
//!
//! TCP DNS messages are prefixed with a 2-byte big-endian length. Each
//! exchange opens a fresh connection.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::timed_out;

/// Send a query to `server` over TCP and return the reply without its length prefix.
pub async fn exchange(query: &[u8], server: SocketAddr, timeout: Duration) -> io::Result<Vec<u8>> {
    tokio::time::timeout(timeout, forward(query, server))
        .await
        .map_err(|_| timed_out(server, timeout))?
}

async fn forward(query: &[u8], server: SocketAddr) -> io::Result<Vec<u8>> {
    let len = u16::try_from(query.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "query too large"))?;

    let mut stream = TcpStream::connect(server).await?;

    let mut framed = Vec::with_capacity(query.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(query);
    stream.write_all(&framed).await?;

    read_dns_message(&mut stream).await
}

/// Read one length-prefixed DNS message from a TCP stream.
pub async fn read_dns_message<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 2];
    stream.read_exact(&mut prefix).await?;

    let msg_len = u16::from_be_bytes(prefix) as usize;
    let mut buf = vec![0u8; msg_len];
    stream.read_exact(&mut buf).await?;

    Ok(buf)
}
