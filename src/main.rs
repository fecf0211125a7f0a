mod analyzer;
mod countries;
mod error;
mod fuzzy;
mod loader;
mod models;
mod report;
mod resolver;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use countries::CountryTable;
use loader::MedalLoader;
use models::Config;
use report::Dashboard;
use resolver::NameResolver;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).with_target(false).init();

    let matches = Command::new("medal-dashboard")
        .version("0.1.0")
        .about("Explores medal standings of an Olympic Games from a CSV medal table")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("top-n")
                .short('n')
                .long("top-n")
                .value_name("N")
                .help("Number of countries listed before the \"Others\" row")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("competition")
                .long("competition")
                .value_name("NAME")
                .help("Show every country's tally for one competition"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Directory for the dashboard and CSV exports"),
        )
        .get_matches();

    let config_file = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.toml");

    // Load or create configuration
    let mut config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)
            .with_context(|| format!("Failed to load configuration from {}", config_file))?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        Config::default().save_to_file(config_file)?;
        println!(
            "⚠️  Please review the data source in {} and run the program again.",
            config_file
        );
        return Ok(());
    };

    if let Some(top_n) = matches.get_one::<usize>("top-n") {
        config.top_n = *top_n;
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output_directory = Some(output.clone());
    }
    config.validate()?;

    let output_dir = config.output_directory.clone().unwrap_or_else(|| "output".to_string());

    // The whole table is loaded before anything is aggregated
    let loader = MedalLoader::new(config.validate_totals);
    let records = loader
        .load_from_config(&config)
        .await
        .context("Failed to load the medal table")?;
    println!("✅ Loaded {} medal rows", records.len());

    let reference = match &config.country_reference_file {
        Some(file) => CountryTable::from_csv_file(file).context("Failed to load the country reference list")?,
        None => CountryTable::embedded(),
    };
    info!(countries = reference.len(), "country reference ready");

    let mut resolver = NameResolver::new(reference, config.fuzzy_threshold);
    let stats = resolver.resolve_all(records.iter().map(|r| r.noc.as_str()));
    let labels = resolver.label_countries(&records);
    info!(identifiers = resolver.cache().len(), "country labels memoized");
    println!(
        "🚩 Flags: {} exact, {} fuzzy, {} without a match",
        stats.exact, stats.fuzzy, stats.unresolved
    );

    let competition = matches.get_one::<String>("competition").map(String::as_str);
    let dashboard = Dashboard::build(
        &records,
        labels,
        stats,
        config.top_n,
        &config.bucket_edges,
        competition,
    );

    if let (Some(name), None) = (competition, &dashboard.detail) {
        let known = analyzer::MedalAnalyzer::new(&records).competitions();
        warn!(competition = name, "unknown competition");
        println!("❌ No competition named \"{}\". Available: {}", name, known.join(", "));
    }

    println!("\n{}", report::render_dashboard(&dashboard));

    report::generate_reports(&dashboard, &output_dir)
        .with_context(|| format!("Failed to write reports to {}", output_dir))?;

    println!("\n✅ Dashboard complete!");
    println!("📂 Reports written to: {}", output_dir);
    Ok(())
}
