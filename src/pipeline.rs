use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use scraper::Html;
use tracing::{info, warn};

use crate::db::{self, PersonRecord};
use crate::fetch::{resolve_link, Fetch};
use crate::parser::{extract_profile, parse_listing, ProfileData};
use crate::reconcile::{from_listing, reconcile};
use crate::settings::Settings;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub periods: usize,
}

#[derive(Debug)]
pub struct RunSummary {
    pub records: usize,
    pub saved: SaveSummary,
}

/// Fetch → parse → enrich → save, one record at a time.
pub fn run<F: Fetch>(fetcher: &F, conn: &Connection, settings: &Settings) -> Result<RunSummary> {
    info!("Starting scraper");
    let records = collect_records(fetcher, &settings.listing_url, &settings.local_nationality)?;
    let saved = save_records(conn, &records)?;
    info!(
        "Scraper finished: {} records, {} inserted, {} already stored",
        records.len(),
        saved.inserted,
        saved.skipped
    );
    Ok(RunSummary {
        records: records.len(),
        saved,
    })
}

/// A failed listing fetch aborts; a failed profile fetch only loses that profile.
pub fn collect_records<F: Fetch>(
    fetcher: &F,
    listing_url: &str,
    local_nationality: &str,
) -> Result<Vec<PersonRecord>> {
    let html = fetcher
        .fetch_html(listing_url)
        .with_context(|| format!("Failed to fetch listing {}", listing_url))?;
    info!("Parsing listing");
    let provisional: Vec<_> = parse_listing(&Html::parse_document(&html)).collect();
    info!("Listing yielded {} governors", provisional.len());

    let pb = ProgressBar::new(provisional.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut records = Vec::with_capacity(provisional.len());
    for record in provisional {
        pb.set_message(record.name.clone());
        let profile = record
            .profile_link
            .as_deref()
            .map(|href| fetch_profile(fetcher, listing_url, href));
        records.push(match profile {
            Some(profile) => reconcile(record, profile, local_nationality),
            None => from_listing(record),
        });
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(records)
}

fn fetch_profile<F: Fetch>(fetcher: &F, listing_url: &str, href: &str) -> ProfileData {
    let html = match resolve_link(listing_url, href).and_then(|url| fetcher.fetch_html(&url)) {
        Ok(html) => html,
        Err(e) => {
            warn!("Profile unavailable for {}: {}", href, e);
            return ProfileData::default();
        }
    };
    match extract_profile(&html) {
        Ok(data) => {
            info!("Profile data extracted for {}", href);
            data
        }
        Err(reason) => {
            warn!("{} skipped: {}", href, reason);
            ProfileData::default()
        }
    }
}

/// Existing persons are skipped whole: no field updates, no period merge.
pub fn save_records(conn: &Connection, records: &[PersonRecord]) -> Result<SaveSummary> {
    info!("Saving {} records to database", records.len());
    let mut summary = SaveSummary::default();
    for record in records {
        if db::person_exists(conn, &record.name, record.profile_link.as_deref())? {
            summary.skipped += 1;
            continue;
        }
        let person_id = db::insert_person(conn, record)?;
        for period in &record.periods {
            db::insert_period(conn, person_id, period)?;
            summary.periods += 1;
        }
        summary.inserted += 1;
    }
    info!("Data saved");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::db::TenurePeriod;
    use crate::error::FetchError;
    use crate::parser::ProvisionalRecord;

    const LISTING_URL: &str = "https://chihuahua.gob.mx/info/gobernadores-del-estado";

    struct CannedFetcher {
        pages: HashMap<String, String>,
    }

    impl CannedFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.clone()))
                    .collect(),
            }
        }
    }

    impl Fetch for CannedFetcher {
        fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    /// Listing fixture plus its profile pages; the Trías page is never served.
    fn site() -> CannedFetcher {
        CannedFetcher::new(&[
            (LISTING_URL, fixture("listing")),
            ("https://es.wikipedia.org/wiki/Jos%C3%A9_Antonio_Arce", fixture("profile")),
            ("https://es.wikipedia.org/wiki/Simon_Elias", fixture("foreign")),
            ("https://es.wikipedia.org/wiki/Teresa_Vega", fixture("disambiguation")),
        ])
    }

    fn settings() -> Settings {
        Settings {
            listing_url: LISTING_URL.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn collects_and_reconciles_fixture_site() {
        let records = collect_records(&site(), LISTING_URL, "Mexicana").unwrap();
        assert_eq!(records.len(), 4);

        let arce = &records[0];
        assert_eq!(arce.nationality.as_deref(), Some("Mexicana"));
        assert_eq!(arce.periods.len(), 3);
        assert_eq!(arce.periods[0], TenurePeriod::new("1826", Some("1827")));

        let elias = &records[1];
        assert_eq!(elias.nationality, None);
        assert_eq!(elias.birth_date, None);
        assert_eq!(elias.periods, vec![TenurePeriod::new("1835", Some("1837"))]);

        let trias = &records[2];
        assert_eq!(trias.occupation, None);
        assert_eq!(trias.periods, vec![TenurePeriod::new("1850", Some("1852"))]);

        let vega = &records[3];
        assert_eq!(vega.birth_date, None);
        assert_eq!(vega.periods, vec![TenurePeriod::new("2021", None)]);
    }

    #[test]
    fn listing_failure_is_fatal() {
        let empty = CannedFetcher::new(&[]);
        let err = collect_records(&empty, LISTING_URL, "Mexicana").unwrap_err();
        assert!(err.to_string().contains("Failed to fetch listing"));
        assert!(err.downcast_ref::<FetchError>().is_some());
    }

    #[test]
    fn record_without_link_skips_profile_fetch() {
        let listing = "<ul class=\"rteindent1\"><li><a>1911</a><a>Abraham González</a></li></ul>";
        let fetcher = CannedFetcher::new(&[(LISTING_URL, listing.to_string())]);
        let records = collect_records(&fetcher, LISTING_URL, "Mexicana").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].profile_link, None);
        assert_eq!(records[0].periods, vec![TenurePeriod::new("1911", None)]);
    }

    #[test]
    fn second_run_inserts_nothing() {
        let conn = db::connect_in_memory().unwrap();
        let fetcher = site();

        let first = run(&fetcher, &conn, &settings()).unwrap();
        assert_eq!(first.records, 4);
        assert_eq!(first.saved.inserted, 4);
        assert_eq!(first.saved.periods, 6);
        let after_first = db::get_stats(&conn).unwrap();

        let second = run(&fetcher, &conn, &settings()).unwrap();
        assert_eq!(
            second.saved,
            SaveSummary {
                inserted: 0,
                skipped: 4,
                periods: 0
            }
        );
        let after_second = db::get_stats(&conn).unwrap();
        assert_eq!(after_first.persons, after_second.persons);
        assert_eq!(after_first.periods, after_second.periods);
        assert_eq!(after_second.periods, 6);
    }

    #[test]
    fn existing_person_is_not_updated() {
        let conn = db::connect_in_memory().unwrap();
        let mut record = from_listing(ProvisionalRecord {
            name: "Juan Pérez".into(),
            profile_link: Some("/wiki/X".into()),
            tenure_guess: TenurePeriod::new("1826", Some("1830")),
        });
        save_records(&conn, std::slice::from_ref(&record)).unwrap();

        record.occupation = Some("Militar".into());
        record.periods.push(TenurePeriod::new("1840", None));
        let summary = save_records(&conn, &[record]).unwrap();
        assert_eq!(summary.skipped, 1);

        let stored = db::list_persons(&conn).unwrap();
        assert_eq!(stored[0].record.occupation, None);
        assert_eq!(stored[0].record.periods.len(), 1);
    }
}
