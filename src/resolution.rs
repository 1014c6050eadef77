//! Resolution rounds: one name against every configured resolver.

use futures::Stream;
use futures::stream;

use crate::directory::NameserverPair;
use crate::engine::QueryEngine;
use crate::error::Result;
use crate::resolver::Lookup;

/// What one resolver said about one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub name: String,
    pub nameservers: NameserverPair,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

/// Resolve `name` against every resolver set of `engine`, local first.
///
/// Rows are produced lazily, one per resolver set. Each round switches the
/// engine's active nameservers before querying. The stream ends after the
/// last set, or right after yielding a fatal error.
pub fn resolve_all<'a, L: Lookup>(
    engine: &'a mut QueryEngine<L>,
    name: &'a str,
) -> impl Stream<Item = Result<ResolutionResult>> + 'a {
    stream::unfold(Some((engine, 0usize)), move |state| async move {
        let (engine, index) = state?;
        let nameservers = *engine.resolver_sets().get(index)?;

        engine.set_active_nameservers(nameservers);
        let row = resolve_round(engine, name, nameservers).await;

        let next = row.is_ok().then_some((engine, index + 1));
        Some((row, next))
    })
}

async fn resolve_round<L: Lookup>(
    engine: &QueryEngine<L>,
    name: &str,
    nameservers: NameserverPair,
) -> Result<ResolutionResult> {
    let ipv4 = engine.query_a(name).await?;
    let ipv6 = engine.query_aaaa(name).await?;

    Ok(ResolutionResult {
        name: name.to_string(),
        nameservers,
        ipv4,
        ipv6,
    })
}
