pub mod listing;
pub mod profile;

pub use listing::{parse_listing, ProvisionalRecord};
pub use profile::{extract_profile, ProfileData};
