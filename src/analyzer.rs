use crate::models::MedalRecord;
use std::collections::{BTreeMap, BTreeSet};

pub const OTHERS_LABEL: &str = "Others";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySummary {
    pub country: String,
    pub gold: u64,
    pub silver: u64,
    pub bronze: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopCountryRow {
    pub country: String,
    pub total: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopCountries {
    pub rows: Vec<TopCountryRow>,
    pub others: TopCountryRow,
    pub grand_total: u64,
}

impl TopCountries {
    /// The leading rows followed by the "Others" row, in display order.
    pub fn all_rows(&self) -> impl Iterator<Item = &TopCountryRow> {
        self.rows.iter().chain(std::iter::once(&self.others))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedalBucket {
    pub label: String,
    pub lower: u32,
    pub upper: u32,
    pub countries: usize,
    pub share: f64,
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedalBuckets {
    pub buckets: Vec<MedalBucket>,
    /// Countries whose total falls outside the configured edges.
    pub unbucketed: Vec<CountrySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionMedals {
    pub competition: String,
    pub gold: u64,
    pub silver: u64,
    pub bronze: u64,
}

impl CompetitionMedals {
    pub fn total(&self) -> u64 {
        self.gold + self.silver + self.bronze
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionLeader {
    pub competition: String,
    pub country: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderShare {
    pub country: String,
    pub competitions_led: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionParticipation {
    pub competition: String,
    pub countries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOverview {
    pub rows: usize,
    pub competitions: usize,
    pub countries: usize,
    /// Countries listed in the table whose summed total is zero.
    pub countries_without_medals: usize,
    pub gold: u64,
    pub silver: u64,
    pub bronze: u64,
    pub total: u64,
    pub largest_row_total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionDetail {
    pub competition: String,
    pub rows: Vec<MedalRecord>,
    pub medals: CompetitionMedals,
}

/// Read-only aggregations over a loaded medal table.
///
/// Groups are collected in ordered maps and every later sort is stable, so
/// rows with equal values always come out in ascending name order.
pub struct MedalAnalyzer<'a> {
    records: &'a [MedalRecord],
}

impl<'a> MedalAnalyzer<'a> {
    pub fn new(records: &'a [MedalRecord]) -> Self {
        Self { records }
    }

    /// Records that belong to a country; rows with an empty NOC are skipped.
    fn country_rows(&self) -> impl Iterator<Item = (String, &'a MedalRecord)> {
        let records: &'a [MedalRecord] = self.records;
        records.iter().filter_map(|record| {
            let country = record.country();
            (!country.is_empty()).then_some((country, record))
        })
    }

    /// Medal sums per country, most medals first.
    pub fn country_summaries(&self) -> Vec<CountrySummary> {
        let mut grouped: BTreeMap<String, CountrySummary> = BTreeMap::new();

        for (country, record) in self.country_rows() {
            let summary = grouped.entry(country.clone()).or_insert_with(|| CountrySummary {
                country,
                gold: 0,
                silver: 0,
                bronze: 0,
                total: 0,
            });
            summary.gold += u64::from(record.gold);
            summary.silver += u64::from(record.silver);
            summary.bronze += u64::from(record.bronze);
            summary.total += u64::from(record.total);
        }

        let mut summaries: Vec<CountrySummary> = grouped.into_values().collect();
        summaries.sort_by(|a, b| b.total.cmp(&a.total));
        summaries
    }

    /// The `n` countries with most medals plus an "Others" row for the rest.
    pub fn top_countries(&self, n: usize) -> TopCountries {
        let summaries = self.country_summaries();
        let grand_total: u64 = summaries.iter().map(|s| s.total).sum();

        let percentage = |total: u64| {
            if grand_total == 0 {
                0.0
            } else {
                total as f64 / grand_total as f64 * 100.0
            }
        };

        let rows: Vec<TopCountryRow> = summaries
            .iter()
            .take(n)
            .map(|s| TopCountryRow {
                country: s.country.clone(),
                total: s.total,
                percentage: percentage(s.total),
            })
            .collect();

        let others_total: u64 = summaries.iter().skip(n).map(|s| s.total).sum();
        let others = TopCountryRow {
            country: OTHERS_LABEL.to_string(),
            total: others_total,
            percentage: percentage(others_total),
        };

        TopCountries {
            rows,
            others,
            grand_total,
        }
    }

    /// Count countries per medal range. Every range is half-open except the
    /// last one, which includes its upper edge.
    pub fn medal_buckets(&self, edges: &[u32]) -> MedalBuckets {
        let summaries = self.country_summaries();
        let bucket_count = edges.len().saturating_sub(1);
        let mut counts = vec![0usize; bucket_count];
        let mut unbucketed = Vec::new();

        for summary in summaries {
            match bucket_index(edges, summary.total) {
                Some(index) => counts[index] += 1,
                None => unbucketed.push(summary),
            }
        }

        let bucketed: usize = counts.iter().sum();
        let mut cumulative_share = 0.0;
        let buckets = counts
            .iter()
            .enumerate()
            .map(|(index, &countries)| {
                let (lower, upper) = (edges[index], edges[index + 1]);
                let is_last = index + 1 == bucket_count;
                let label = if is_last {
                    format!("{}-{}", lower, upper)
                } else {
                    format!("{}-{}", lower, upper - 1)
                };
                let share = if bucketed == 0 {
                    0.0
                } else {
                    countries as f64 / bucketed as f64 * 100.0
                };
                cumulative_share += share;

                MedalBucket {
                    label,
                    lower,
                    upper,
                    countries,
                    share,
                    cumulative_share,
                }
            })
            .collect();

        MedalBuckets { buckets, unbucketed }
    }

    /// Gold, silver and bronze per competition, most medals first.
    pub fn competition_medals(&self) -> Vec<CompetitionMedals> {
        let mut grouped: BTreeMap<&str, (u64, u64, u64)> = BTreeMap::new();

        for record in self.records {
            let sums = grouped.entry(record.competition.as_str()).or_default();
            sums.0 += u64::from(record.gold);
            sums.1 += u64::from(record.silver);
            sums.2 += u64::from(record.bronze);
        }

        let mut medals: Vec<CompetitionMedals> = grouped
            .into_iter()
            .map(|(competition, (gold, silver, bronze))| CompetitionMedals {
                competition: competition.to_string(),
                gold,
                silver,
                bronze,
            })
            .collect();
        medals.sort_by(|a, b| b.total().cmp(&a.total()));
        medals
    }

    /// The country with most medals in each competition, ordered by
    /// competition. On equal totals the alphabetically first country leads.
    pub fn competition_leaders(&self) -> Vec<CompetitionLeader> {
        let mut totals: BTreeMap<(&str, String), u64> = BTreeMap::new();
        for (country, record) in self.country_rows() {
            *totals.entry((record.competition.as_str(), country)).or_default() += u64::from(record.total);
        }

        let mut leaders: Vec<CompetitionLeader> = Vec::new();
        for ((competition, country), total) in totals {
            match leaders.last_mut() {
                Some(leader) if leader.competition == competition => {
                    if total > leader.total {
                        leader.country = country;
                        leader.total = total;
                    }
                }
                _ => leaders.push(CompetitionLeader {
                    competition: competition.to_string(),
                    country,
                    total,
                }),
            }
        }
        leaders
    }

    /// How often each country leads a competition, as a share of all
    /// competitions with a leader.
    pub fn leader_shares(&self) -> Vec<LeaderShare> {
        let leaders = self.competition_leaders();
        let competitions = leaders.len();

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for leader in leaders {
            *counts.entry(leader.country).or_default() += 1;
        }

        let mut shares: Vec<LeaderShare> = counts
            .into_iter()
            .map(|(country, competitions_led)| LeaderShare {
                country,
                competitions_led,
                share: competitions_led as f64 / competitions as f64 * 100.0,
            })
            .collect();
        shares.sort_by(|a, b| b.competitions_led.cmp(&a.competitions_led));
        shares
    }

    /// Distinct countries per competition, widest participation first.
    pub fn participation(&self) -> Vec<CompetitionParticipation> {
        let mut grouped: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for record in self.records {
            let countries = grouped.entry(record.competition.as_str()).or_default();
            let country = record.country();
            if !country.is_empty() {
                countries.insert(country);
            }
        }

        let mut participation: Vec<CompetitionParticipation> = grouped
            .into_iter()
            .map(|(competition, countries)| CompetitionParticipation {
                competition: competition.to_string(),
                countries: countries.len(),
            })
            .collect();
        participation.sort_by(|a, b| b.countries.cmp(&a.countries));
        participation
    }

    pub fn overview(&self) -> DatasetOverview {
        let competitions: BTreeSet<&str> = self.records.iter().map(|r| r.competition.as_str()).collect();
        let summaries = self.country_summaries();

        DatasetOverview {
            rows: self.records.len(),
            competitions: competitions.len(),
            countries: summaries.len(),
            countries_without_medals: summaries.iter().filter(|s| s.total == 0).count(),
            gold: self.records.iter().map(|r| u64::from(r.gold)).sum(),
            silver: self.records.iter().map(|r| u64::from(r.silver)).sum(),
            bronze: self.records.iter().map(|r| u64::from(r.bronze)).sum(),
            total: self.records.iter().map(|r| u64::from(r.total)).sum(),
            largest_row_total: self.records.iter().map(|r| r.total).max().unwrap_or(0),
        }
    }

    /// Every row of one competition (most medals first) with its medal split.
    pub fn competition_detail(&self, competition: &str) -> Option<CompetitionDetail> {
        let wanted = competition.trim();
        let mut rows: Vec<MedalRecord> = self
            .records
            .iter()
            .filter(|record| record.competition == wanted)
            .cloned()
            .collect();

        if rows.is_empty() {
            return None;
        }

        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.country().cmp(&b.country())));

        let medals = CompetitionMedals {
            competition: wanted.to_string(),
            gold: rows.iter().map(|r| u64::from(r.gold)).sum(),
            silver: rows.iter().map(|r| u64::from(r.silver)).sum(),
            bronze: rows.iter().map(|r| u64::from(r.bronze)).sum(),
        };

        Some(CompetitionDetail {
            competition: wanted.to_string(),
            rows,
            medals,
        })
    }

    pub fn competitions(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.records.iter().map(|r| r.competition.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }
}

fn bucket_index(edges: &[u32], total: u64) -> Option<usize> {
    let last = edges.len().checked_sub(2)?;
    edges.windows(2).enumerate().find_map(|(index, pair)| {
        let (lower, upper) = (u64::from(pair[0]), u64::from(pair[1]));
        let inside = if index == last {
            total >= lower && total <= upper
        } else {
            total >= lower && total < upper
        };
        inside.then_some(index)
    })
}
