//! Resolve - compare what the local resolver and a set of public resolvers
//! say about DNS names.
//!
//! The [`engine::QueryEngine`] sends A/AAAA queries to one nameserver pair at
//! a time; [`resolution::resolve_all`] walks it across every configured pair.

pub mod config;
pub mod directory;
pub mod dns;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod resolution;
pub mod resolver;
pub mod transport;

pub use directory::{DIRECTORY, DirectoryEntry, NameserverPair};
pub use engine::QueryEngine;
pub use error::{Error, QueryError, Result};
pub use resolution::{ResolutionResult, resolve_all};
pub use resolver::{Lookup, StubResolver};
