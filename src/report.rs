use crate::analyzer::{
    CompetitionDetail, CompetitionLeader, CompetitionMedals, CompetitionParticipation, CountrySummary,
    DatasetOverview, LeaderShare, MedalAnalyzer, MedalBuckets, TopCountries,
};
use crate::models::MedalRecord;
use crate::resolver::{Resolution, ResolutionStats};
use anyhow::Result;
use csv::Writer;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BAR_WIDTH: usize = 30;

/// Every view of the dashboard, computed once from the loaded table.
pub struct Dashboard {
    pub top_n: usize,
    pub overview: DatasetOverview,
    pub summaries: Vec<CountrySummary>,
    pub top: TopCountries,
    pub buckets: MedalBuckets,
    pub competition_medals: Vec<CompetitionMedals>,
    pub leaders: Vec<CompetitionLeader>,
    pub leader_shares: Vec<LeaderShare>,
    pub participation: Vec<CompetitionParticipation>,
    pub labels: BTreeMap<String, Resolution>,
    pub resolution_stats: ResolutionStats,
    pub detail: Option<CompetitionDetail>,
}

impl Dashboard {
    pub fn build(
        records: &[MedalRecord],
        labels: BTreeMap<String, Resolution>,
        resolution_stats: ResolutionStats,
        top_n: usize,
        bucket_edges: &[u32],
        competition: Option<&str>,
    ) -> Self {
        let analyzer = MedalAnalyzer::new(records);

        Self {
            top_n,
            overview: analyzer.overview(),
            summaries: analyzer.country_summaries(),
            top: analyzer.top_countries(top_n),
            buckets: analyzer.medal_buckets(bucket_edges),
            competition_medals: analyzer.competition_medals(),
            leaders: analyzer.competition_leaders(),
            leader_shares: analyzer.leader_shares(),
            participation: analyzer.participation(),
            labels,
            resolution_stats,
            detail: competition.and_then(|name| analyzer.competition_detail(name)),
        }
    }

    fn flag(&self, country: &str) -> String {
        self.labels
            .get(country)
            .and_then(Resolution::flag)
            .unwrap_or_default()
    }

    fn flag_prefix(&self, country: &str) -> String {
        match self.flag(country) {
            flag if flag.is_empty() => "   ".to_string(),
            flag => format!("{} ", flag),
        }
    }

    fn canonical_name(&self, country: &str) -> String {
        self.labels
            .get(country)
            .and_then(Resolution::country)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn unresolved(&self) -> Vec<(&str, u8)> {
        self.labels
            .iter()
            .filter_map(|(country, resolution)| match resolution {
                Resolution::Unresolved { best_score } => Some((country.as_str(), *best_score)),
                _ => None,
            })
            .collect()
    }
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (value as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width)
}

/// Text rendering of the whole dashboard.
pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut content = String::new();
    render_overview(&mut content, dashboard);
    render_top_countries(&mut content, dashboard);
    render_medal_buckets(&mut content, dashboard);
    render_competition_medals(&mut content, dashboard);
    render_competition_leaders(&mut content, dashboard);
    render_participation(&mut content, dashboard);
    if let Some(detail) = &dashboard.detail {
        render_competition_detail(&mut content, dashboard, detail);
    }
    render_resolution(&mut content, dashboard);
    content
}

fn render_overview(content: &mut String, dashboard: &Dashboard) {
    let overview = &dashboard.overview;
    content.push_str("🏅 Olympic Medal Dashboard\n");
    content.push_str("==========================\n\n");
    content.push_str(&format!("📋 The games contained {} competitions.\n", overview.competitions));
    content.push_str(&format!("📋 {} countries appear in the medal table.\n", overview.countries));
    content.push_str(&format!(
        "📋 {} of them did not win any medal.\n",
        overview.countries_without_medals
    ));
    content.push_str(&format!("📋 Rows in the medal table: {}\n", overview.rows));
    content.push_str(&format!(
        "📋 Medals awarded: {} (🥇 {} / 🥈 {} / 🥉 {})\n",
        overview.total, overview.gold, overview.silver, overview.bronze
    ));
    content.push_str(&format!("📋 Largest tally in a single competition: {}\n\n", overview.largest_row_total));
}

fn render_top_countries(content: &mut String, dashboard: &Dashboard) {
    content.push_str(&format!("⛰️  Top {} Countries by Total Medals\n", dashboard.top_n));
    content.push_str("-----------------------------------\n");

    let max = dashboard.top.all_rows().map(|r| r.total).max().unwrap_or(0);
    for row in dashboard.top.all_rows() {
        content.push_str(&format!(
            "{}{:<28} {:<30} {:>4} {:>5.1}%\n",
            dashboard.flag_prefix(&row.country),
            row.country,
            bar(row.total, max),
            row.total,
            row.percentage
        ));
    }
    content.push_str("Percentage reflects the share of total medals won by each country.\n\n");
}

fn render_medal_buckets(content: &mut String, dashboard: &Dashboard) {
    content.push_str("🪣 Number of Countries by Medal Range\n");
    content.push_str("------------------------------------\n");

    let max = dashboard
        .buckets
        .buckets
        .iter()
        .map(|b| b.countries as u64)
        .max()
        .unwrap_or(0);
    for bucket in &dashboard.buckets.buckets {
        content.push_str(&format!(
            "{:>7} {:<30} {:>4} {:>5.1}%  (cumulative {:>5.1}%)\n",
            bucket.label,
            bar(bucket.countries as u64, max),
            bucket.countries,
            bucket.share,
            bucket.cumulative_share
        ));
    }
    if !dashboard.buckets.unbucketed.is_empty() {
        let outside: Vec<String> = dashboard
            .buckets
            .unbucketed
            .iter()
            .map(|s| format!("{} ({})", s.country, s.total))
            .collect();
        content.push_str(&format!("Outside the medal ranges: {}\n", outside.join(", ")));
    }
    content.push_str("Percentage reflects the share of countries in each medal range.\n\n");
}

fn render_competition_medals(content: &mut String, dashboard: &Dashboard) {
    content.push_str("📊 Medal Distribution by Competition\n");
    content.push_str("-----------------------------------\n");

    let max = dashboard
        .competition_medals
        .iter()
        .map(CompetitionMedals::total)
        .max()
        .unwrap_or(0);
    for medals in &dashboard.competition_medals {
        content.push_str(&format!(
            "{:<24} 🥇{:>4} 🥈{:>4} 🥉{:>4}  {:<30} {:>4}\n",
            medals.competition,
            medals.gold,
            medals.silver,
            medals.bronze,
            bar(medals.total(), max),
            medals.total()
        ));
    }
    content.push('\n');
}

fn render_competition_leaders(content: &mut String, dashboard: &Dashboard) {
    content.push_str("🏆 Countries with the most won medals per competition\n");
    content.push_str("----------------------------------------------------\n");

    let mut leaders: Vec<&CompetitionLeader> = dashboard.leaders.iter().collect();
    leaders.sort_by(|a, b| a.country.cmp(&b.country));
    for leader in leaders {
        content.push_str(&format!(
            "{:<24}  {}{:<20} won {:>3} medals.\n",
            leader.competition,
            dashboard.flag_prefix(&leader.country),
            leader.country,
            leader.total
        ));
    }

    content.push_str("\nShare of competitions led:\n");
    for share in &dashboard.leader_shares {
        content.push_str(&format!(
            "   {}{:<20} {:>3} competitions ({:.1}%)\n",
            dashboard.flag_prefix(&share.country),
            share.country,
            share.competitions_led,
            share.share
        ));
    }
    content.push('\n');
}

fn render_participation(content: &mut String, dashboard: &Dashboard) {
    content.push_str("👥 Number of Countries Participating by Competition\n");
    content.push_str("--------------------------------------------------\n");

    let max = dashboard
        .participation
        .iter()
        .map(|p| p.countries as u64)
        .max()
        .unwrap_or(0);
    for participation in &dashboard.participation {
        content.push_str(&format!(
            "{:<24} {:<30} {:>4}\n",
            participation.competition,
            bar(participation.countries as u64, max),
            participation.countries
        ));
    }
    content.push('\n');
}

fn render_competition_detail(content: &mut String, dashboard: &Dashboard, detail: &CompetitionDetail) {
    content.push_str(&format!("🔬 Investigating {}\n", detail.competition));
    content.push_str(&format!("-----------------{}\n", "-".repeat(detail.competition.chars().count())));

    for row in &detail.rows {
        let country = row.country();
        content.push_str(&format!(
            "   {}{:<24} 🥇{:>3} 🥈{:>3} 🥉{:>3}  total {:>3}\n",
            dashboard.flag_prefix(&country),
            country,
            row.gold,
            row.silver,
            row.bronze,
            row.total
        ));
    }

    let medals = &detail.medals;
    let max = medals.gold.max(medals.silver).max(medals.bronze);
    content.push_str("\n📊 Medal distribution\n");
    for (name, count) in [("Gold", medals.gold), ("Silver", medals.silver), ("Bronze", medals.bronze)] {
        content.push_str(&format!("   {:<7} {:<30} {:>4}\n", name, bar(count, max), count));
    }
    content.push('\n');
}

fn render_resolution(content: &mut String, dashboard: &Dashboard) {
    let stats = dashboard.resolution_stats;
    content.push_str("🚩 Country flags\n");
    content.push_str("---------------\n");
    content.push_str(&format!(
        "Exact matches: {}, fuzzy matches: {}, without flag: {}\n",
        stats.exact, stats.fuzzy, stats.unresolved
    ));

    for (country, best_score) in dashboard.unresolved() {
        content.push_str(&format!("   ❓ {} (best score {})\n", country, best_score));
    }
}

/// Write the text dashboard and every CSV export into `output_dir`.
pub fn generate_reports(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    fs::write(Path::new(output_dir).join("dashboard.txt"), render_dashboard(dashboard))?;

    generate_top_countries_csv(dashboard, output_dir)?;
    generate_country_summary_csv(dashboard, output_dir)?;
    generate_medal_buckets_csv(dashboard, output_dir)?;
    generate_competition_medals_csv(dashboard, output_dir)?;
    generate_competition_leaders_csv(dashboard, output_dir)?;
    generate_leader_shares_csv(dashboard, output_dir)?;
    generate_participation_csv(dashboard, output_dir)?;
    generate_resolution_csv(dashboard, output_dir)?;
    if let Some(detail) = &dashboard.detail {
        generate_competition_detail_csv(detail, output_dir)?;
    }
    Ok(())
}

fn generate_top_countries_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("top_countries.csv"))?;
    writer.write_record(["Country", "Flag", "Total_Medals", "Percentage"])?;

    for row in dashboard.top.all_rows() {
        writer.write_record([
            row.country.clone(),
            dashboard.flag(&row.country),
            row.total.to_string(),
            format!("{:.3}", row.percentage),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_country_summary_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("country_summary.csv"))?;
    writer.write_record([
        "Country",
        "Flag",
        "Canonical_Name",
        "Total_Medals",
        "Gold_Medals",
        "Silver_Medals",
        "Bronze_Medals",
    ])?;

    for summary in &dashboard.summaries {
        writer.write_record([
            summary.country.clone(),
            dashboard.flag(&summary.country),
            dashboard.canonical_name(&summary.country),
            summary.total.to_string(),
            summary.gold.to_string(),
            summary.silver.to_string(),
            summary.bronze.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_medal_buckets_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("medal_buckets.csv"))?;
    writer.write_record(["Medal_Range", "Number_of_Countries", "Share_of_Countries", "Cumulative_Share"])?;

    for bucket in &dashboard.buckets.buckets {
        writer.write_record([
            bucket.label.clone(),
            bucket.countries.to_string(),
            format!("{:.3}", bucket.share),
            format!("{:.3}", bucket.cumulative_share),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_competition_medals_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("competition_medals.csv"))?;
    writer.write_record(["Competition", "Gold", "Silver", "Bronze", "Total"])?;

    for medals in &dashboard.competition_medals {
        writer.write_record([
            medals.competition.clone(),
            medals.gold.to_string(),
            medals.silver.to_string(),
            medals.bronze.to_string(),
            medals.total().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_competition_leaders_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("competition_leaders.csv"))?;
    writer.write_record(["Competition", "Country", "Flag", "Total"])?;

    for leader in &dashboard.leaders {
        writer.write_record([
            leader.competition.clone(),
            leader.country.clone(),
            dashboard.flag(&leader.country),
            leader.total.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_leader_shares_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("leader_shares.csv"))?;
    writer.write_record(["Country", "Competitions_Led", "Share"])?;

    for share in &dashboard.leader_shares {
        writer.write_record([
            share.country.clone(),
            share.competitions_led.to_string(),
            format!("{:.3}", share.share),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_participation_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("participation.csv"))?;
    writer.write_record(["Competition", "Number_of_Countries"])?;

    for participation in &dashboard.participation {
        writer.write_record([participation.competition.clone(), participation.countries.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_resolution_csv(dashboard: &Dashboard, output_dir: &str) -> Result<()> {
    let mut writer = Writer::from_path(Path::new(output_dir).join("country_resolution.csv"))?;
    writer.write_record(["Country", "Match", "Canonical_Name", "Alpha_2", "Flag", "Score"])?;

    for (country, resolution) in &dashboard.labels {
        let (kind, score) = match resolution {
            Resolution::Exact(_) => ("exact", 100),
            Resolution::Fuzzy { score, .. } => ("fuzzy", *score),
            Resolution::Unresolved { best_score } => ("unresolved", *best_score),
        };
        let canonical = resolution.country();
        writer.write_record([
            country.clone(),
            kind.to_string(),
            canonical.map(|c| c.name.clone()).unwrap_or_default(),
            canonical.map(|c| c.alpha_2.clone()).unwrap_or_default(),
            resolution.flag().unwrap_or_default(),
            score.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn generate_competition_detail_csv(detail: &CompetitionDetail, output_dir: &str) -> Result<()> {
    let file_name: String = detail
        .competition
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let csv_path = Path::new(output_dir).join(format!("competition_{}.csv", file_name));
    let mut writer = Writer::from_path(csv_path)?;
    writer.write_record(["NOC", "Competitions", "Gold", "Silver", "Bronze", "Total"])?;

    for row in &detail.rows {
        writer.write_record([
            row.noc.clone(),
            row.competition.clone(),
            row.gold.to_string(),
            row.silver.to_string(),
            row.bronze.to_string(),
            row.total.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::CountryTable;
    use crate::models::DEFAULT_BUCKET_EDGES;
    use crate::resolver::{NameResolver, DEFAULT_THRESHOLD};

    fn sample_dashboard(competition: Option<&str>) -> Dashboard {
        let records = vec![
            MedalRecord::new("United States", "Athletics", 14, 11, 9),
            MedalRecord::new("China", "Diving", 8, 2, 1),
            MedalRecord::new("Côte d'Ivoire", "Athletics", 0, 0, 1),
            MedalRecord::new("Zzqx", "Judo", 0, 1, 0),
        ];
        let mut resolver = NameResolver::new(CountryTable::embedded(), DEFAULT_THRESHOLD);
        let stats = resolver.resolve_all(records.iter().map(|r| r.noc.as_str()));
        let labels = resolver.label_countries(&records);

        Dashboard::build(&records, labels, stats, 2, &DEFAULT_BUCKET_EDGES, competition)
    }

    #[test]
    fn dashboard_text_has_every_section() {
        let text = render_dashboard(&sample_dashboard(Some("Athletics")));

        assert!(text.contains("Top 2 Countries by Total Medals"));
        assert!(text.contains("🇺🇸 United States"));
        assert!(text.contains("Others"));
        assert!(text.contains("0-4"));
        assert!(text.contains("Medal Distribution by Competition"));
        assert!(text.contains("won  11 medals."));
        assert!(text.contains("Investigating Athletics"));
        assert!(text.contains("❓ Zzqx"));
    }

    #[test]
    fn overview_reports_countries_without_any_medal() {
        let records = vec![
            MedalRecord::new("France", "Judo", 2, 2, 4),
            MedalRecord::new("Iceland", "Judo", 0, 0, 0),
            MedalRecord::new("Iceland", "Swimming", 0, 0, 0),
        ];
        let dashboard = Dashboard::build(
            &records,
            BTreeMap::new(),
            ResolutionStats::default(),
            5,
            &DEFAULT_BUCKET_EDGES,
            None,
        );

        assert_eq!(dashboard.overview.countries_without_medals, 1);
        let text = render_dashboard(&dashboard);
        assert!(text.contains("📋 2 countries appear in the medal table."));
        assert!(text.contains("📋 1 of them did not win any medal."));
    }

    #[test]
    fn unresolved_country_keeps_its_medals() {
        let dashboard = sample_dashboard(None);
        let zzqx = dashboard.summaries.iter().find(|s| s.country == "Zzqx").unwrap();

        assert_eq!(zzqx.total, 1);
        assert_eq!(dashboard.flag("Zzqx"), "");
        assert_eq!(dashboard.top.grand_total, 47);
    }

    #[test]
    fn reports_are_written_to_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();

        generate_reports(&sample_dashboard(Some("Athletics")), output_dir).unwrap();

        for file in [
            "dashboard.txt",
            "top_countries.csv",
            "country_summary.csv",
            "medal_buckets.csv",
            "competition_medals.csv",
            "competition_leaders.csv",
            "leader_shares.csv",
            "participation.csv",
            "country_resolution.csv",
            "competition_athletics.csv",
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }

        let top = fs::read_to_string(dir.path().join("top_countries.csv")).unwrap();
        let lines: Vec<&str> = top.lines().collect();
        assert_eq!(lines[0], "Country,Flag,Total_Medals,Percentage");
        assert_eq!(lines[1], "United States,🇺🇸,34,72.340");
        assert_eq!(lines[3], "Others,,2,4.255");

        let resolution = fs::read_to_string(dir.path().join("country_resolution.csv")).unwrap();
        assert!(resolution.contains("Cte dIvoire,fuzzy,Côte d'Ivoire,CI,🇨🇮,96"));
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(10, 10).chars().count(), BAR_WIDTH);
        assert_eq!(bar(5, 10).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(3, 0), "");
    }
}
