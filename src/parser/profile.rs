use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::db::TenurePeriod;
use crate::error::Unusable;

pub const BIRTH_LABEL: &str = "Nacimiento";
pub const DEATH_LABEL: &str = "Fallecimiento";
pub const OCCUPATION_LABEL: &str = "Ocupación";
pub const NATIONALITY_LABEL: &str = "Nacionalidad";

const OFFICE_TITLE: &str = "Gobernador de Chihuahua";
const SECTION_BOUNDARY: &str = "Información personal";

static DISAMBIGUATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#disambigbox").expect("valid selector"));
static MISSING_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.mw-newarticletextanon, div.noarticletext").expect("valid selector")
});
static TH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static TD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static HR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("hr").expect("valid selector"));
static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// Biographical facts from a profile page. `default()` is the "no data" result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileData {
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub occupation: Option<String>,
    pub nationality: Option<String>,
    pub tenure_periods: Vec<TenurePeriod>,
}

pub fn extract_profile(html: &str) -> Result<ProfileData, Unusable> {
    let document = Html::parse_document(html);

    if document.select(&DISAMBIGUATION_SEL).next().is_some() {
        return Err(Unusable::Disambiguation);
    }
    if document.select(&MISSING_SEL).next().is_some() {
        return Err(Unusable::MissingArticle);
    }

    let mut fields = label_map(&document);
    Ok(ProfileData {
        birth_date: fields.remove(BIRTH_LABEL).flatten(),
        death_date: fields.remove(DEATH_LABEL).flatten(),
        occupation: fields.remove(OCCUPATION_LABEL).flatten(),
        nationality: fields.remove(NATIONALITY_LABEL).flatten(),
        tenure_periods: tenure_periods(&document),
    })
}

// ── Labelled fields ──

/// Header text → text of the next `td` sibling. The first header with a given
/// label decides; if it has no `td`, the field stays absent.
fn label_map(document: &Html) -> HashMap<String, Option<String>> {
    let mut fields = HashMap::new();
    for th in document.select(&TH_SEL) {
        let label = th.text().collect::<String>().trim().to_string();
        if label.is_empty() || fields.contains_key(&label) {
            continue;
        }
        let value = th
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "td")
            .map(joined_text);
        fields.insert(label, value);
    }
    fields
}

fn joined_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tenure history ──

fn tenure_periods(document: &Html) -> Vec<TenurePeriod> {
    let Some(title_row) = office_row(document) else {
        return Vec::new();
    };

    let mut periods = Vec::new();
    for row in title_row
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
    {
        let Some(cell) = row.select(&TD_SEL).next() else {
            break;
        };
        if row
            .select(&TH_SEL)
            .any(|th| th.text().collect::<String>().contains(SECTION_BOUNDARY))
        {
            break;
        }
        if row.select(&TH_SEL).next().is_some() || row.select(&HR_SEL).next().is_some() {
            continue;
        }
        periods.push(parse_period(&cell.text().collect::<String>()));
    }
    periods
}

/// Row holding the office-title link; the infobox lists terms beneath it.
/// Matching anchors outside any table (hatnotes, lead text) are passed over.
fn office_row(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&ANCHOR_SEL)
        .filter(|a| a.text().collect::<String>().contains(OFFICE_TITLE))
        .find_map(|a| {
            a.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "tr")
        })
}

/// `"1826-1830"` → 1826..1830, `"1826"` → open. Splits on the first hyphen only.
pub fn parse_period(text: &str) -> TenurePeriod {
    match text.trim().split_once('-') {
        Some((start, end)) => TenurePeriod::new(start, Some(end)),
        None => TenurePeriod::new(text, None),
    }
}
