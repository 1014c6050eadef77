//! Directory of free and public DNS resolvers.
//!
//! The list is static and ordered, so output rows come out in the same
//! order on every run.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// The one or two addresses of a single resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameserverPair {
    primary: IpAddr,
    secondary: Option<IpAddr>,
}

impl NameserverPair {
    pub const fn new(primary: IpAddr, secondary: IpAddr) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// A resolver with a single nameserver.
    pub const fn single(primary: IpAddr) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn secondary(&self) -> Option<IpAddr> {
        self.secondary
    }

    /// Addresses in query order.
    pub fn addrs(&self) -> impl Iterator<Item = IpAddr> + use<> {
        std::iter::once(self.primary).chain(self.secondary)
    }

    /// Both addresses joined by `sep`; a missing second address renders empty.
    pub fn join(&self, sep: &str) -> String {
        match self.secondary {
            Some(secondary) => format!("{}{sep}{}", self.primary, secondary),
            None => format!("{}{sep}", self.primary),
        }
    }
}

/// Renders as `addr1;addr2`, or `addr1;` for a single-address resolver.
impl fmt::Display for NameserverPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(";"))
    }
}

/// A public resolver and who runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub nameservers: NameserverPair,
    pub provider: &'static str,
}

const fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(a, b, c, d))
}

const fn pair(provider: &'static str, primary: IpAddr, secondary: IpAddr) -> DirectoryEntry {
    DirectoryEntry {
        nameservers: NameserverPair::new(primary, secondary),
        provider,
    }
}

const fn single(provider: &'static str, primary: IpAddr) -> DirectoryEntry {
    DirectoryEntry {
        nameservers: NameserverPair::single(primary),
        provider,
    }
}

/// Free and public DNS resolvers, queried in this order after the local one.
pub static DIRECTORY: &[DirectoryEntry] = &[
    pair("Level3", v4(209, 244, 0, 3), v4(209, 244, 0, 4)),
    pair("Verisign", v4(64, 6, 64, 6), v4(64, 6, 65, 6)),
    pair("Google", v4(8, 8, 8, 8), v4(8, 8, 4, 4)),
    pair("Quad9", v4(9, 9, 9, 9), v4(149, 112, 112, 112)),
    pair("DNS.WATCH", v4(84, 200, 69, 80), v4(84, 200, 70, 40)),
    pair("Comodo Secure DNS", v4(8, 26, 56, 26), v4(8, 20, 247, 20)),
    pair("OpenDNS Home", v4(208, 67, 222, 222), v4(208, 67, 220, 220)),
    pair("Norton ConnectSafe", v4(199, 85, 126, 10), v4(199, 85, 127, 10)),
    pair("GreenTeamDNS", v4(81, 218, 119, 11), v4(209, 88, 198, 133)),
    pair("SafeDNS", v4(195, 46, 39, 39), v4(195, 46, 39, 40)),
    pair("OpenNIC", v4(69, 195, 152, 204), v4(23, 94, 60, 240)),
    pair("SmartViper", v4(208, 76, 50, 50), v4(208, 76, 51, 51)),
    pair("Dyn", v4(216, 146, 35, 35), v4(216, 146, 36, 36)),
    pair("FreeDNS", v4(37, 235, 1, 174), v4(37, 235, 1, 177)),
    pair("Alternate DNS", v4(198, 101, 242, 72), v4(23, 253, 163, 53)),
    pair("Yandex.DNS", v4(77, 88, 8, 8), v4(77, 88, 8, 1)),
    pair("UncensoredDNS", v4(91, 239, 100, 100), v4(89, 233, 43, 71)),
    single("Hurricane Electric", v4(74, 82, 42, 42)),
    single("puntCAT", v4(109, 69, 8, 51)),
    pair("Neustar", v4(156, 154, 70, 1), v4(156, 154, 71, 1)),
    pair("Cloudflare", v4(1, 1, 1, 1), v4(1, 0, 0, 1)),
    single("Fourth Estate", v4(45, 77, 165, 194)),
    pair("CleanBrowsing", v4(185, 228, 168, 9), v4(185, 228, 169, 9)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn directory_has_every_provider_once() {
        let providers: HashSet<_> = DIRECTORY.iter().map(|e| e.provider).collect();

        assert_eq!(DIRECTORY.len(), 23);
        assert_eq!(providers.len(), DIRECTORY.len());
    }

    #[test]
    fn directory_addresses_are_distinct() {
        let addrs: Vec<_> = DIRECTORY.iter().flat_map(|e| e.nameservers.addrs()).collect();
        let unique: HashSet<_> = addrs.iter().collect();

        assert_eq!(addrs.len(), unique.len());
    }

    #[test]
    fn pair_renders_both_addresses() {
        let google = DIRECTORY.iter().find(|e| e.provider == "Google").unwrap();

        assert_eq!(google.nameservers.to_string(), "8.8.8.8;8.8.4.4");
        assert_eq!(google.nameservers.join(","), "8.8.8.8,8.8.4.4");
    }

    #[test]
    fn single_address_renders_empty_second_field() {
        let fourth = DIRECTORY.iter().find(|e| e.provider == "Fourth Estate").unwrap();

        assert_eq!(fourth.nameservers.secondary(), None);
        assert_eq!(fourth.nameservers.to_string(), "45.77.165.194;");
        assert_eq!(fourth.nameservers.addrs().count(), 1);
    }
}
