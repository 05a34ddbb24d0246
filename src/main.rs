mod db;
mod error;
mod fetch;
mod parser;
mod pipeline;
mod reconcile;
mod settings;
#[cfg(test)]
mod test_support;

use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "governor_scraper",
    about = "Chihuahua governors roster, enriched from Wikipedia"
)]
struct Cli {
    /// SQLite database path (overrides GOV_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the listing, enrich each governor and store new ones
    Run {
        /// Listing page URL (overrides GOV_LISTING_URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print stored governors and their periods
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show row counts
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Run { url } => {
            if let Some(url) = url {
                settings.listing_url = url;
            }
            let fetcher = fetch::HttpFetcher::new(&settings.user_agent)?;
            let summary = pipeline::run(&fetcher, &conn, &settings)?;
            println!(
                "Done: {} governors ({} new, {} already stored, {} periods written) in {:.1}s",
                summary.records,
                summary.saved.inserted,
                summary.saved.skipped,
                summary.saved.periods,
                t0.elapsed().as_secs_f64()
            );
        }
        Commands::List { json } => {
            let persons = db::list_persons(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&persons)?);
                return Ok(());
            }
            if persons.is_empty() {
                println!("No governors stored. Run 'run' first.");
                return Ok(());
            }
            for p in &persons {
                let r = &p.record;
                println!(
                    "{:>3} | {:<32} | {:<10} | {}",
                    p.id,
                    truncate(&r.name, 32),
                    r.nationality.as_deref().unwrap_or("-"),
                    r.profile_link.as_deref().unwrap_or("-"),
                );
                for period in &r.periods {
                    println!(
                        "    | {} - {}",
                        period.start,
                        period.end.as_deref().unwrap_or("")
                    );
                }
            }
            println!("\n{} governors", persons.len());
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Governors:        {}", s.persons);
            println!("Without profile:  {}", s.without_profile);
            println!("Periods:          {}", s.periods);
            println!("Open periods:     {}", s.open_periods);
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
