//! Query engine.
//!
//! Holds the nameserver pair queries currently go to, plus the fixed list of
//! pairs a resolution round walks (the local pair first, then every public
//! resolver). Recoverable lookup failures are logged here and turned into
//! empty results; anything else is returned to the caller.

use std::fmt;

use tracing::{error, warn};

use crate::directory::{DIRECTORY, DirectoryEntry, NameserverPair};
use crate::dns::RecordType;
use crate::error::{Error, QueryError, Result};
use crate::resolver::Lookup;

pub struct QueryEngine<L> {
    lookup: L,
    active: NameserverPair,
    resolver_sets: Vec<NameserverPair>,
}

impl<L: Lookup> QueryEngine<L> {
    /// Create an engine that starts on `local` and walks `local` followed by `directory`.
    pub fn new(lookup: L, local: NameserverPair, directory: &[DirectoryEntry]) -> Self {
        let resolver_sets = std::iter::once(local)
            .chain(directory.iter().map(|entry| entry.nameservers))
            .collect();

        Self {
            lookup,
            active: local,
            resolver_sets,
        }
    }

    /// Create an engine over the built-in list of public resolvers.
    pub fn with_public_resolvers(lookup: L, local: NameserverPair) -> Self {
        Self::new(lookup, local, DIRECTORY)
    }

    /// Send subsequent queries to `nameservers`.
    pub fn set_active_nameservers(&mut self, nameservers: NameserverPair) {
        self.active = nameservers;
    }

    pub fn active_nameservers(&self) -> &NameserverPair {
        &self.active
    }

    /// Every pair a resolution round visits, in order.
    pub fn resolver_sets(&self) -> &[NameserverPair] {
        &self.resolver_sets
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// IPv4 addresses of `name` according to the active nameservers.
    pub async fn query_a(&self, name: &str) -> Result<Vec<String>> {
        self.run_query(name, RecordType::A).await
    }

    /// IPv6 addresses of `name` according to the active nameservers.
    pub async fn query_aaaa(&self, name: &str) -> Result<Vec<String>> {
        self.run_query(name, RecordType::Aaaa).await
    }

    async fn run_query(&self, name: &str, rtype: RecordType) -> Result<Vec<String>> {
        let err = match self.lookup.lookup(&self.active, name, rtype).await {
            Ok(addresses) => return Ok(addresses),
            Err(err) => err,
        };

        let context = format!(
            "query-<{}>-({},{}): {}",
            self.active.join(","),
            name,
            rtype,
            err
        );

        match err {
            QueryError::NameNotFound { .. } | QueryError::Timeout { .. } => {
                error!("{context}");
                Ok(Vec::new())
            }
            QueryError::NoAnswer { .. } => {
                warn!("{context}");
                Ok(Vec::new())
            }
            QueryError::Unclassified(_) => Err(Error::Query {
                context,
                source: err,
            }),
        }
    }
}

/// Renders the configured resolver sets as `[count]: <ns1;ns2>, <ns1;ns2>, ...`.
impl<L> fmt::Display for QueryEngine<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: ", self.resolver_sets.len())?;
        for (i, pair) in self.resolver_sets.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "<{pair}>")?;
        }
        Ok(())
    }
}

impl<L> fmt::Debug for QueryEngine<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("active", &self.active)
            .field("resolver_sets", &self.resolver_sets.len())
            .finish()
    }
}
