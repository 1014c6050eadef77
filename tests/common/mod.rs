//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, UdpSocket};
use tracing_subscriber::fmt::MakeWriter;

use resolve::dns::{CLASS_IN, DnsQuery, DnsRecord, DnsResponse, RCODE_NOERROR, RCODE_NXDOMAIN};
use resolve::dns::RecordType;
use resolve::transport::tcp::read_dns_message;
use resolve::{Lookup, NameserverPair, QueryError};

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events to the buffer until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Engine diagnostics, i.e. lines carrying a query context.
    pub fn diagnostics(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.contains("query-<"))
            .collect()
    }
}

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}

/// Deterministic in-memory lookup.
///
/// Outcomes are keyed by record type; every call is recorded.
#[derive(Default)]
pub struct MockLookup {
    outcomes: HashMap<RecordType, Result<Vec<String>, QueryError>>,
    calls: Mutex<Vec<(NameserverPair, String, RecordType)>>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rtype: RecordType, outcome: Result<Vec<&str>, QueryError>) -> Self {
        let outcome = outcome.map(|addrs| addrs.into_iter().map(str::to_string).collect());
        self.outcomes.insert(rtype, outcome);
        self
    }

    pub fn calls(&self) -> Vec<(NameserverPair, String, RecordType)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Lookup for MockLookup {
    async fn lookup(
        &self,
        nameservers: &NameserverPair,
        name: &str,
        rtype: RecordType,
    ) -> Result<Vec<String>, QueryError> {
        self.calls
            .lock()
            .unwrap()
            .push((*nameservers, name.to_string(), rtype));

        self.outcomes.get(&rtype).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// How a mock nameserver answers.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// NOERROR with every address whose family matches the question.
    Answer(Vec<IpAddr>),
    NxDomain,
    Rcode(u8),
    /// Never reply.
    Silent,
    /// Reply over UDP with TC set and no answers; answer fully over TCP.
    Truncate(Vec<IpAddr>),
    /// Like `Truncate`, but wait before every reply.
    SlowTruncate(Duration, Vec<IpAddr>),
    /// Reply with the right ID to a question that was never asked.
    WrongQuestion,
}

pub struct MockNameserver {
    pub addr: SocketAddr,
    udp_hits: Arc<AtomicUsize>,
    tcp_hits: Arc<AtomicUsize>,
}

impl MockNameserver {
    /// Bind on an ephemeral port of `ip`.
    pub async fn spawn(ip: &str, behavior: Behavior) -> Self {
        Self::spawn_on(SocketAddr::new(ip.parse().unwrap(), 0), behavior).await
    }

    /// Bind on `addr`, serving UDP and TCP on the same port.
    pub async fn spawn_on(addr: SocketAddr, behavior: Behavior) -> Self {
        let socket = UdpSocket::bind(addr).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let listener = TcpListener::bind(addr).await.unwrap();

        let udp_hits = Arc::new(AtomicUsize::new(0));
        let tcp_hits = Arc::new(AtomicUsize::new(0));

        tokio::spawn(serve_udp(socket, behavior.clone(), udp_hits.clone()));
        tokio::spawn(serve_tcp(listener, behavior, tcp_hits.clone()));

        Self {
            addr,
            udp_hits,
            tcp_hits,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn udp_hits(&self) -> usize {
        self.udp_hits.load(Ordering::SeqCst)
    }

    pub fn tcp_hits(&self) -> usize {
        self.tcp_hits.load(Ordering::SeqCst)
    }
}

fn respond(query: &DnsQuery, behavior: &Behavior, over_tcp: bool) -> Option<Vec<u8>> {
    let (rcode, addrs, truncate) = match behavior {
        Behavior::Answer(addrs) => (RCODE_NOERROR, addrs.as_slice(), false),
        Behavior::NxDomain => (RCODE_NXDOMAIN, &[][..], false),
        Behavior::Rcode(rcode) => (*rcode, &[][..], false),
        Behavior::Silent => return None,
        Behavior::Truncate(addrs) | Behavior::SlowTruncate(_, addrs) => {
            (RCODE_NOERROR, addrs.as_slice(), !over_tcp)
        }
        Behavior::WrongQuestion => {
            let mut other = query.clone();
            other.domain = format!("not-{}", query.domain);
            return Some(DnsResponse::reply_to(&other, RCODE_NOERROR).to_bytes());
        }
    };

    let mut response = DnsResponse::reply_to(query, rcode);
    if truncate {
        response.set_truncated();
        return Some(response.to_bytes());
    }

    for addr in addrs {
        let (rtype, rdata) = match addr {
            IpAddr::V4(v4) => (RecordType::A, v4.octets().to_vec()),
            IpAddr::V6(v6) => (RecordType::Aaaa, v6.octets().to_vec()),
        };
        if rtype.code() != query.qtype {
            continue;
        }
        response.answers.push(DnsRecord {
            name: query.domain.clone(),
            rtype: rtype.code(),
            class: CLASS_IN,
            ttl: 300,
            rdata,
        });
    }

    Some(response.to_bytes())
}

async fn delay(behavior: &Behavior) {
    if let Behavior::SlowTruncate(delay, _) = behavior {
        tokio::time::sleep(*delay).await;
    }
}

async fn serve_udp(socket: UdpSocket, behavior: Behavior, hits: Arc<AtomicUsize>) {
    let mut buf = [0u8; 4096];

    loop {
        let Ok((len, src)) = socket.recv_from(&mut buf).await else {
            continue;
        };
        let Some(query) = DnsQuery::parse(&buf[..len]) else {
            continue;
        };
        hits.fetch_add(1, Ordering::SeqCst);
        delay(&behavior).await;

        if let Some(reply) = respond(&query, &behavior, false) {
            let _ = socket.send_to(&reply, src).await;
        }
    }
}

async fn serve_tcp(listener: TcpListener, behavior: Behavior, hits: Arc<AtomicUsize>) {
    loop {
        let Ok((mut stream, _)) = listener.accept().await else {
            continue;
        };
        let Ok(message) = read_dns_message(&mut stream).await else {
            continue;
        };
        let Some(query) = DnsQuery::parse(&message) else {
            continue;
        };
        hits.fetch_add(1, Ordering::SeqCst);
        delay(&behavior).await;

        if let Some(reply) = respond(&query, &behavior, true) {
            let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
            framed.extend_from_slice(&reply);
            let _ = stream.write_all(&framed).await;
        }
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}
