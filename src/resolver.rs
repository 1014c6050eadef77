//! Stub resolver: sends one question to a nameserver pair and classifies the reply.
//!
//! Nameserver iteration within a pair:
//! 1. Each attempt round walks the pair's addresses in order
//! 2. A timeout moves on to the next address
//! 3. A transport failure or an unusable RCODE retires the address for this query
//! 4. The first NOERROR or NXDOMAIN reply decides the outcome
//!
//! The query engine only sees the classified [`QueryError`].

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use tracing::debug;

use crate::config::ResolverOptions;
use crate::directory::NameserverPair;
use crate::dns::{DnsQuery, DnsResponse, RCODE_NOERROR, RCODE_NXDOMAIN, RecordType};
use crate::error::QueryError;
use crate::transport;

/// Something that can answer an A/AAAA question using a given nameserver pair.
pub trait Lookup {
    /// Look up `rtype` records for `name` at `nameservers`.
    ///
    /// Addresses are returned in the order the nameserver sent them.
    fn lookup(
        &self,
        nameservers: &NameserverPair,
        name: &str,
        rtype: RecordType,
    ) -> impl Future<Output = Result<Vec<String>, QueryError>>;
}

/// What a single reply tells us.
enum Reply {
    Answer(Vec<String>),
    NameNotFound,
    NoAnswer,
    /// This server cannot help; try the other one.
    Unusable(u8),
}

fn classify(response: &DnsResponse, rtype: RecordType) -> Reply {
    match response.rcode() {
        RCODE_NOERROR => {
            let addresses = response.addresses(rtype);
            if addresses.is_empty() {
                Reply::NoAnswer
            } else {
                Reply::Answer(addresses)
            }
        }
        RCODE_NXDOMAIN => Reply::NameNotFound,
        rcode => Reply::Unusable(rcode),
    }
}

fn rcode_text(rcode: u8) -> &'static str {
    match rcode {
        1 => "FORMERR",
        2 => "SERVFAIL",
        4 => "NOTIMP",
        5 => "REFUSED",
        _ => "unexpected rcode",
    }
}

/// Built-in stub resolver speaking DNS over UDP (TCP on truncation).
#[derive(Debug, Clone, Default)]
pub struct StubResolver {
    options: ResolverOptions,
}

impl StubResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }
}

impl Lookup for StubResolver {
    async fn lookup(
        &self,
        nameservers: &NameserverPair,
        name: &str,
        rtype: RecordType,
    ) -> Result<Vec<String>, QueryError> {
        let query = DnsQuery::new(rand::random(), name, rtype)
            .map_err(|e| QueryError::unclassified(format!("invalid name `{name}`: {e}")))?;

        let started = Instant::now();
        let deadline = started + self.options.lifetime;

        let mut alive: Vec<SocketAddr> = nameservers
            .addrs()
            .map(|ip| SocketAddr::new(ip, self.options.port))
            .collect();
        let mut failures: Vec<String> = Vec::new();

        for attempt in 0..self.options.attempts {
            let mut i = 0;
            while i < alive.len() {
                let server = alive[i];
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(QueryError::Timeout {
                        elapsed: started.elapsed(),
                    });
                }
                let timeout = self.options.timeout.min(remaining);

                match transport::exchange(&query, server, Instant::now() + timeout).await {
                    Ok(response) => match classify(&response, rtype) {
                        Reply::Answer(addresses) => return Ok(addresses),
                        Reply::NameNotFound => {
                            return Err(QueryError::NameNotFound {
                                name: query.domain.clone(),
                            });
                        }
                        Reply::NoAnswer => {
                            return Err(QueryError::NoAnswer {
                                name: query.domain.clone(),
                                rtype,
                            });
                        }
                        Reply::Unusable(rcode) => {
                            debug!(%server, rcode, "nameserver answered {}", rcode_text(rcode));
                            failures.push(format!("{server} answered {}", rcode_text(rcode)));
                            alive.remove(i);
                        }
                    },
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        debug!(%server, attempt, "{e}");
                        i += 1;
                    }
                    Err(e) => {
                        debug!(%server, "{e}");
                        failures.push(format!("{server}: {e}"));
                        alive.remove(i);
                    }
                }
            }

            if alive.is_empty() {
                break;
            }
        }

        if alive.is_empty() {
            return Err(QueryError::unclassified(format!(
                "All nameservers failed to answer the query {} IN {rtype}: {}",
                query.domain,
                failures.join("; ")
            )));
        }

        Err(QueryError::Timeout {
            elapsed: started.elapsed(),
        })
    }
}
