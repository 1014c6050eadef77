//! Local resolver configuration.
//!
//! The local nameserver pair and query options are read from
//! `/etc/resolv.conf`, the same place the system's own stub resolver looks.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use resolv_conf::ScopedIp;
use tracing::debug;

use crate::directory::NameserverPair;
use crate::error::{Error, Result};

/// Default location of the system resolver configuration.
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Knobs for the stub resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Port nameservers listen on.
    pub port: u16,
    /// Time to wait for one nameserver to answer one attempt.
    pub timeout: Duration,
    /// Rounds over the pair's nameservers before giving up.
    pub attempts: u32,
    /// Total time allowed for one query across all nameservers and attempts.
    pub lifetime: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            port: 53,
            timeout: Duration::from_secs(5),
            attempts: 2,
            lifetime: Duration::from_secs(10),
        }
    }
}

/// What the system resolver is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// The first two usable nameservers.
    pub local: NameserverPair,
    pub options: ResolverOptions,
}

impl SystemConfig {
    /// Load the configuration from [`RESOLV_CONF`].
    pub fn load() -> Result<Self> {
        Self::from_file(RESOLV_CONF)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;

        Self::parse(&text)
    }

    /// Parse resolv.conf syntax.
    ///
    /// Only the nameservers and the `timeout:`/`attempts:` options are used.
    pub fn parse(text: &str) -> Result<Self> {
        let conf = resolv_conf::Config::parse(text)
            .map_err(|e| Error::config(format!("invalid resolver configuration: {e}")))?;

        let mut nameservers = conf.nameservers.iter().filter_map(|ns| match ns {
            ScopedIp::V4(ip) => Some(IpAddr::V4(*ip)),
            ScopedIp::V6(ip, None) => Some(IpAddr::V6(*ip)),
            // Link-local addresses need their scope, which a plain socket address drops.
            ScopedIp::V6(ip, Some(scope)) => {
                debug!(%ip, %scope, "skipping scoped nameserver");
                None
            }
        });

        let local = match (nameservers.next(), nameservers.next()) {
            (None, _) => return Err(Error::config("no usable nameserver configured")),
            (Some(primary), None) => NameserverPair::single(primary),
            (Some(primary), Some(secondary)) => NameserverPair::new(primary, secondary),
        };

        let mut options = ResolverOptions::default();
        if conf.timeout > 0 {
            options.timeout = Duration::from_secs(conf.timeout.into());
        }
        if conf.attempts > 0 {
            options.attempts = conf.attempts;
        }

        Ok(Self { local, options })
    }
}
