use tracing::warn;

use crate::db::PersonRecord;
use crate::parser::{ProfileData, ProvisionalRecord};

/// Listing-only record, used when there is no profile to consult.
pub fn from_listing(record: ProvisionalRecord) -> PersonRecord {
    PersonRecord {
        name: record.name,
        profile_link: record.profile_link,
        birth_date: None,
        death_date: None,
        occupation: None,
        nationality: None,
        periods: vec![record.tenure_guess],
    }
}

/// Profile data is trusted when its nationality is absent or local. A foreign
/// nationality means the link points at someone else, so the whole profile is dropped.
pub fn reconcile(
    record: ProvisionalRecord,
    profile: ProfileData,
    local_nationality: &str,
) -> PersonRecord {
    if let Some(nationality) = profile.nationality.as_deref() {
        if nationality != local_nationality {
            warn!(
                "Nationality of governor {} from profile is {}. Skipping profile data.",
                record.name, nationality
            );
            return from_listing(record);
        }
    }

    let periods = if profile.tenure_periods.is_empty() {
        vec![record.tenure_guess]
    } else {
        profile.tenure_periods
    };

    PersonRecord {
        name: record.name,
        profile_link: record.profile_link,
        birth_date: profile.birth_date,
        death_date: profile.death_date,
        occupation: profile.occupation,
        nationality: profile.nationality,
        periods,
    }
}
