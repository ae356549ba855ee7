//! US state and territory lookup.
//!
//! Resolves FIPS codes, postal abbreviations, full names and close
//! misspellings of full names to the postal abbreviation.

use rapidfuzz::distance::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a misspelled name to match.
pub const STATE_NAME_SIMILARITY: f64 = 0.9;

/// A state or territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    pub name: &'static str,
    pub abbr: &'static str,
    pub fips: &'static str,
}

const fn state(name: &'static str, abbr: &'static str, fips: &'static str) -> UsState {
    UsState { name, abbr, fips }
}

pub const STATES: [UsState; 57] = [
    state("Alabama", "AL", "01"),
    state("Alaska", "AK", "02"),
    state("Arizona", "AZ", "04"),
    state("Arkansas", "AR", "05"),
    state("California", "CA", "06"),
    state("Colorado", "CO", "08"),
    state("Connecticut", "CT", "09"),
    state("Delaware", "DE", "10"),
    state("District of Columbia", "DC", "11"),
    state("Florida", "FL", "12"),
    state("Georgia", "GA", "13"),
    state("Hawaii", "HI", "15"),
    state("Idaho", "ID", "16"),
    state("Illinois", "IL", "17"),
    state("Indiana", "IN", "18"),
    state("Iowa", "IA", "19"),
    state("Kansas", "KS", "20"),
    state("Kentucky", "KY", "21"),
    state("Louisiana", "LA", "22"),
    state("Maine", "ME", "23"),
    state("Maryland", "MD", "24"),
    state("Massachusetts", "MA", "25"),
    state("Michigan", "MI", "26"),
    state("Minnesota", "MN", "27"),
    state("Mississippi", "MS", "28"),
    state("Missouri", "MO", "29"),
    state("Montana", "MT", "30"),
    state("Nebraska", "NE", "31"),
    state("Nevada", "NV", "32"),
    state("New Hampshire", "NH", "33"),
    state("New Jersey", "NJ", "34"),
    state("New Mexico", "NM", "35"),
    state("New York", "NY", "36"),
    state("North Carolina", "NC", "37"),
    state("North Dakota", "ND", "38"),
    state("Ohio", "OH", "39"),
    state("Oklahoma", "OK", "40"),
    state("Oregon", "OR", "41"),
    state("Pennsylvania", "PA", "42"),
    state("Rhode Island", "RI", "44"),
    state("South Carolina", "SC", "45"),
    state("South Dakota", "SD", "46"),
    state("Tennessee", "TN", "47"),
    state("Texas", "TX", "48"),
    state("Utah", "UT", "49"),
    state("Vermont", "VT", "50"),
    state("Virginia", "VA", "51"),
    state("Washington", "WA", "53"),
    state("West Virginia", "WV", "54"),
    state("Wisconsin", "WI", "55"),
    state("Wyoming", "WY", "56"),
    state("American Samoa", "AS", "60"),
    state("Guam", "GU", "66"),
    state("Northern Mariana Islands", "MP", "69"),
    state("Puerto Rico", "PR", "72"),
    state("Virgin Islands", "VI", "78"),
    state("Washington DC", "DC", "11"),
];

/// Finds a state by FIPS code, abbreviation, name or a close misspelling.
pub fn lookup(raw: &str) -> Option<&'static UsState> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if value.len() == 2 {
        if value.chars().all(|c| c.is_ascii_digit()) {
            return STATES.iter().find(|s| s.fips == value);
        }
        if value.chars().all(|c| c.is_ascii_alphabetic()) {
            return STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(value));
        }
    }
    if let Some(found) = STATES.iter().find(|s| s.name.eq_ignore_ascii_case(value)) {
        return Some(found);
    }
    let normalized = value.to_lowercase();
    STATES
        .iter()
        .map(|s| {
            let score = jaro_winkler::similarity(
                normalized.chars(),
                s.name.to_lowercase().chars(),
            );
            (s, score)
        })
        .filter(|(_, score)| *score >= STATE_NAME_SIMILARITY)
        .fold(None, |best: Option<(&UsState, f64)>, candidate| match best {
            Some((_, top)) if top >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(s, _)| s)
}

/// Postal abbreviation for a recognised state.
pub fn abbreviation(raw: &str) -> Option<&'static str> {
    lookup(raw).map(|s| s.abbr)
}
