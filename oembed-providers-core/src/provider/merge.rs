// Merging, ordering and keying of raw records

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::warn;

use super::model::Provider;
use super::raw::RawProvider;

/// Validated providers keyed by name, in rebuild order
pub type ProviderMap = IndexMap<String, Provider>;

/// Start from the external list, then apply the custom list by name
///
/// External records sharing a name with any custom record are replaced by
/// it; the result holds every name of both inputs.
#[must_use]
pub fn merge(external: Vec<RawProvider>, custom: Vec<RawProvider>) -> Vec<RawProvider> {
    let overridden: HashSet<String> = custom.iter().map(|r| r.name().to_string()).collect();

    external
        .into_iter()
        .filter(|r| !overridden.contains(r.name()))
        .chain(custom)
        .collect()
}

/// Stable, case-insensitive sort by provider name
pub fn sort_by_name(records: &mut [RawProvider]) {
    records.sort_by_cached_key(|r| r.name().to_lowercase());
}

/// Validate each record, dropping the ones that fail
///
/// A later record with the same name replaces an earlier one in place.
#[must_use]
pub fn build_providers(records: &[RawProvider]) -> ProviderMap {
    let mut providers = ProviderMap::with_capacity(records.len());

    for record in records {
        match Provider::try_from(record) {
            Ok(provider) => {
                providers.insert(provider.name().to_string(), provider);
            }
            Err(e) => {
                warn!(provider = %record.name(), error = %e, "Skipping invalid oEmbed provider");
            }
        }
    }

    providers
}

/// Exact name lookup, falling back to a case-insensitive match
#[must_use]
pub fn lookup<'a>(providers: &'a ProviderMap, name: &str) -> Option<&'a Provider> {
    providers.get(name).or_else(|| {
        let wanted = name.to_lowercase();
        providers
            .values()
            .find(|provider| provider.name().to_lowercase() == wanted)
    })
}
