//! Transport layer for sending DNS queries to a nameserver.
//!
//! Queries go out over UDP first. A truncated UDP reply is retried over TCP
//! against the same server.

pub mod tcp;
pub mod udp;

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::dns::{DnsQuery, DnsResponse};

/// Maximum size of a DNS packet (with some headroom).
pub const MAX_DNS_PACKET_SIZE: usize = 4096;

/// Transport protocol identifier for logging.
#[derive(Debug, Clone, Copy)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

/// Send `query` to `server` and return the parsed response.
///
/// Both the UDP exchange and a TCP retry after truncation must finish by
/// `deadline`. A timeout surfaces as an error of kind
/// [`io::ErrorKind::TimedOut`]; an unparseable reply, or one answering a
/// different question, as [`io::ErrorKind::InvalidData`].
pub async fn exchange(query: &DnsQuery, server: SocketAddr, deadline: Instant) -> io::Result<DnsResponse> {
    let wire = query.to_bytes();

    let reply = udp::exchange(&wire, server, remaining(deadline)).await?;
    let response = parse(&reply, query, Protocol::Udp)?;

    if !response.is_truncated() {
        return Ok(response);
    }

    debug!(%server, "truncated reply, retrying over {}", Protocol::Tcp.as_str());
    let reply = tcp::exchange(&wire, server, remaining(deadline)).await?;

    parse(&reply, query, Protocol::Tcp)
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

fn parse(reply: &[u8], query: &DnsQuery, protocol: Protocol) -> io::Result<DnsResponse> {
    let response = DnsResponse::parse(reply).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("malformed {} response ({} bytes)", protocol.as_str(), reply.len()),
        )
    })?;

    if !response.answers_question(query) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} response does not match the question", protocol.as_str()),
        ));
    }

    Ok(response)
}

pub(crate) fn timed_out(server: SocketAddr, timeout: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("no response from {server} within {:.3}s", timeout.as_secs_f64()),
    )
}
