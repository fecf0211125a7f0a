use crate::countries::{Country, CountryLookup};
use crate::fuzzy::weighted_ratio;
use crate::models::{normalize_noc, MedalRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact(Country),
    Fuzzy { country: Country, score: u8 },
    Unresolved { best_score: u8 },
}

impl Resolution {
    pub fn country(&self) -> Option<&Country> {
        match self {
            Resolution::Exact(country) | Resolution::Fuzzy { country, .. } => Some(country),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn flag(&self) -> Option<String> {
        self.country().and_then(Country::flag)
    }
}

/// Resolutions keyed by raw identifier. A key is written at most once.
#[derive(Debug, Default, Clone)]
pub struct ResolverCache {
    entries: HashMap<String, Resolution>,
}

impl ResolverCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, raw: &str) -> Option<&Resolution> {
        self.entries.get(raw)
    }

    fn insert_once(&mut self, raw: &str, resolution: Resolution) -> &Resolution {
        self.entries.entry(raw.to_string()).or_insert(resolution)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    pub exact: usize,
    pub fuzzy: usize,
    pub unresolved: usize,
}

/// Maps raw NOC labels to canonical countries, purely for decoration.
pub struct NameResolver<L: CountryLookup> {
    lookup: L,
    cache: ResolverCache,
    threshold: u8,
}

impl<L: CountryLookup> NameResolver<L> {
    pub fn new(lookup: L, threshold: u8) -> Self {
        Self::with_cache(lookup, threshold, ResolverCache::new())
    }

    pub fn with_cache(lookup: L, threshold: u8, cache: ResolverCache) -> Self {
        Self {
            lookup,
            cache,
            threshold,
        }
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    /// Forget every memoized resolution.
    #[cfg(test)]
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    pub fn resolve(&mut self, raw: &str) -> Resolution {
        if let Some(cached) = self.cache.get(raw) {
            return cached.clone();
        }
        let resolution = self.resolve_uncached(raw);
        self.cache.insert_once(raw, resolution).clone()
    }

    fn resolve_uncached(&self, raw: &str) -> Resolution {
        let normalized = normalize_noc(raw);

        if let Some(country) = self.lookup.get_by_name(&normalized) {
            return Resolution::Exact(country.clone());
        }

        match self.best_match(&normalized) {
            Some((country, score)) if score >= self.threshold => {
                debug!(raw, matched = %country.name, score, "fuzzy country match");
                Resolution::Fuzzy {
                    country: country.clone(),
                    score,
                }
            }
            Some((_, score)) => Resolution::Unresolved { best_score: score },
            None => Resolution::Unresolved { best_score: 0 },
        }
    }

    /// Highest scoring canonical country; the first one wins on equal scores.
    pub fn best_match(&self, normalized: &str) -> Option<(&Country, u8)> {
        let mut best: Option<(&Country, u8)> = None;
        for country in self.lookup.countries() {
            let score = weighted_ratio(normalized, &country.name);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((country, score));
            }
        }
        best
    }

    /// Resolve every distinct identifier once and count the outcomes.
    pub fn resolve_all<'a>(&mut self, raws: impl IntoIterator<Item = &'a str>) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for raw in raws {
            if !seen.insert(raw) {
                continue;
            }

            match self.resolve(raw) {
                Resolution::Exact(_) => stats.exact += 1,
                Resolution::Fuzzy { .. } => stats.fuzzy += 1,
                Resolution::Unresolved { best_score } => {
                    warn!(raw, best_score, "no canonical country found");
                    stats.unresolved += 1;
                }
            }
        }

        stats
    }

    /// Resolution per grouping key (normalized NOC), first row wins.
    pub fn label_countries(&mut self, records: &[MedalRecord]) -> BTreeMap<String, Resolution> {
        let mut labels = BTreeMap::new();
        for record in records {
            let key = record.country();
            if key.is_empty() || labels.contains_key(&key) {
                continue;
            }
            let resolution = self.resolve(&record.noc);
            labels.insert(key, resolution);
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::CountryTable;
    use std::cell::Cell;

    struct CountingLookup {
        table: CountryTable,
        scans: Cell<usize>,
    }

    impl CountryLookup for CountingLookup {
        fn get_by_name(&self, name: &str) -> Option<&Country> {
            self.table.get_by_name(name)
        }

        fn countries(&self) -> &[Country] {
            self.scans.set(self.scans.get() + 1);
            self.table.countries()
        }
    }

    fn counting(countries: Vec<Country>) -> CountingLookup {
        CountingLookup {
            table: CountryTable::from_countries(countries),
            scans: Cell::new(0),
        }
    }

    #[test]
    fn exact_match_skips_fuzzy_scan() {
        let lookup = counting(vec![Country::new("FR", "FRA", "France"), Country::new("JP", "JPN", "Japan")]);
        let mut resolver = NameResolver::new(lookup, DEFAULT_THRESHOLD);

        let resolution = resolver.resolve("  France ");
        assert_eq!(resolution, Resolution::Exact(Country::new("FR", "FRA", "France")));
        assert_eq!(resolver.lookup.scans.get(), 0);
    }

    #[test]
    fn punctuation_is_stripped_before_exact_lookup() {
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);
        let resolution = resolver.resolve("United States.");
        assert_eq!(resolution.country().map(|c| c.alpha_2.as_str()), Some("US"));
        assert!(matches!(resolution, Resolution::Exact(_)));
    }

    #[test]
    fn cote_divoire_resolves_through_fuzzy_match() {
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);

        match resolver.resolve("Côte d'Ivoire") {
            Resolution::Fuzzy { country, score } => {
                assert_eq!(country.name, "Côte d'Ivoire");
                assert!(score >= 30);
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn nonsense_identifier_is_unresolved() {
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);

        let resolution = resolver.resolve("Zzqx");
        match resolution {
            Resolution::Unresolved { best_score } => assert!(best_score < 30),
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert_eq!(resolution.flag(), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        // "zzqx" vs "Iraq" scores exactly 25
        let table = CountryTable::from_countries(vec![Country::new("IQ", "IRQ", "Iraq")]);

        let mut strict = NameResolver::new(table.clone(), 26);
        assert_eq!(strict.resolve("zzqx"), Resolution::Unresolved { best_score: 25 });

        let mut lenient = NameResolver::new(table, 25);
        assert!(matches!(lenient.resolve("zzqx"), Resolution::Fuzzy { score: 25, .. }));
    }

    #[test]
    fn equal_scores_pick_first_country_in_reference_order() {
        let abc = Country::new("AC", "", "Abc");
        let abd = Country::new("AD", "", "Abd");

        let mut resolver = NameResolver::new(
            CountryTable::from_countries(vec![abc.clone(), abd.clone()]),
            DEFAULT_THRESHOLD,
        );
        assert_eq!(resolver.resolve("Ab"), Resolution::Fuzzy { country: abc.clone(), score: 90 });

        let mut reversed = NameResolver::new(CountryTable::from_countries(vec![abd.clone(), abc]), DEFAULT_THRESHOLD);
        assert_eq!(reversed.resolve("Ab"), Resolution::Fuzzy { country: abd, score: 90 });
    }

    #[test]
    fn repeated_identifiers_hit_the_cache() {
        let lookup = counting(vec![Country::new("CI", "CIV", "Côte d'Ivoire")]);
        let mut resolver = NameResolver::new(lookup, DEFAULT_THRESHOLD);

        let first = resolver.resolve("Côte d'Ivoire");
        let second = resolver.resolve("Côte d'Ivoire");

        assert_eq!(first, second);
        assert_eq!(resolver.lookup.scans.get(), 1);
        assert_eq!(resolver.cache().len(), 1);

        resolver.reset_cache();
        assert!(resolver.cache().is_empty());
        assert_eq!(resolver.resolve("Côte d'Ivoire"), first);
        assert_eq!(resolver.lookup.scans.get(), 2);
    }

    #[test]
    fn resolve_all_counts_distinct_identifiers() {
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);
        let stats = resolver.resolve_all(["France", "France", "Côte d'Ivoire", "Zzqx", "Japan"]);

        assert_eq!(
            stats,
            ResolutionStats {
                exact: 2,
                fuzzy: 1,
                unresolved: 1
            }
        );
        assert_eq!(resolver.cache().len(), 4);
    }

    #[test]
    fn labels_are_keyed_by_normalized_country() {
        let records = vec![
            MedalRecord::new("France", "Judo", 2, 2, 4),
            MedalRecord::new(" France.", "Fencing", 2, 2, 1),
            MedalRecord::new("Zzqx", "Judo", 0, 0, 1),
        ];
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);
        let labels = resolver.label_countries(&records);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels["France"].flag().as_deref(), Some("🇫🇷"));
        assert!(labels["Zzqx"].country().is_none());
    }
}
