use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::db::TenurePeriod;

static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.rteindent1 li").expect("valid selector"));
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// A governor as seen on the listing page, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalRecord {
    pub name: String,
    pub profile_link: Option<String>,
    pub tenure_guess: TenurePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonLink {
    pub name: String,
    pub href: Option<String>,
}

/// Shape of one list item, decided by how many anchors it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    /// `<a>start</a><a href>name</a>`, still serving or end unknown.
    Open { start: String, person: PersonLink },
    /// `<a>start</a><a>end</a><a href>name</a>`
    Closed {
        start: String,
        end: String,
        person: PersonLink,
    },
    Malformed { links: usize },
}

impl ListItem {
    pub fn classify(li: ElementRef<'_>) -> Self {
        let links: Vec<ElementRef<'_>> = li.select(&LINK_SEL).collect();
        match links.as_slice() {
            [start, person] => ListItem::Open {
                start: anchor_text(*start),
                person: person_link(*person),
            },
            [start, end, person] => ListItem::Closed {
                start: anchor_text(*start),
                end: anchor_text(*end),
                person: person_link(*person),
            },
            other => ListItem::Malformed { links: other.len() },
        }
    }

    pub fn into_record(self) -> Option<ProvisionalRecord> {
        let (person, tenure_guess) = match self {
            ListItem::Open { start, person } => (person, TenurePeriod::new(&start, None)),
            ListItem::Closed { start, end, person } => {
                (person, TenurePeriod::new(&start, Some(end.as_str())))
            }
            ListItem::Malformed { .. } => return None,
        };
        Some(ProvisionalRecord {
            name: person.name,
            profile_link: person.href,
            tenure_guess,
        })
    }
}

/// Lazily yields one record per well-formed list item, in document order.
pub fn parse_listing(document: &Html) -> impl Iterator<Item = ProvisionalRecord> + '_ {
    document.select(&ITEM_SEL).filter_map(|li| {
        let item = ListItem::classify(li);
        if let ListItem::Malformed { links } = item {
            warn!("Unexpected number of links in list item: {}", links);
        }
        item.into_record()
    })
}

fn anchor_text(a: ElementRef<'_>) -> String {
    a.text().collect::<String>().trim().to_string()
}

fn person_link(a: ElementRef<'_>) -> PersonLink {
    PersonLink {
        name: anchor_text(a),
        href: a.value().attr("href").map(str::to_string),
    }
}
