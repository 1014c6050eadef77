//! UDP transport for DNS queries.
//!
//! Since UDP is connectionless, replies are matched to the query by their
//! 16-bit query ID; anything else arriving on the socket is discarded.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::trace;

use super::{timed_out, MAX_DNS_PACKET_SIZE};

/// Send a query datagram to `server` and wait for the matching reply.
pub async fn exchange(query: &[u8], server: SocketAddr, timeout: Duration) -> io::Result<Vec<u8>> {
    if query.len() < 2 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "query too short"));
    }

    let local: SocketAddr = if server.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(query).await?;

    let query_id = [query[0], query[1]];

    tokio::time::timeout(timeout, recv_matching(&socket, query_id))
        .await
        .map_err(|_| timed_out(server, timeout))?
}

async fn recv_matching(socket: &UdpSocket, query_id: [u8; 2]) -> io::Result<Vec<u8>> {
    let mut buf = [0u8; MAX_DNS_PACKET_SIZE];

    loop {
        let len = socket.recv(&mut buf).await?;

        if len < 12 || buf[..2] != query_id {
            trace!(len, "discarding unrelated datagram");
            continue;
        }

        return Ok(buf[..len].to_vec());
    }
}
