//! Chain detection by repeated normalized business names.
//!
//! Branches of the same business tend to share a name once location words
//! and branch suffixes are stripped ("Reyes Bakery - Lipa" and
//! "Reyes Bakery (Batangas City)" both become "reyes bakery"). A name that
//! shows up in several search locations, or more than once within one, is
//! treated as a chain.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::regions;
use super::Listing;

/// A normalized name seen in at least this many distinct search locations
/// is a chain.
pub const MIN_LOCATIONS: usize = 2;

/// A normalized name seen at least this many times within one search
/// location is a chain.
pub const MIN_REPEATS_WITHIN_LOCATION: usize = 2;

static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("valid regex"));

/// Branch suffix separators: " - Lipa", " | Batangas", " – SM Lipa".
static BRANCH_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—|]\s+.*$").expect("valid regex"));

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9ñ\s]").expect("valid regex"));

static BRANCH_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(branch|main|outlet|store\s+\d+|no\.?\s*\d+)\b").expect("valid regex")
});

/// Normalize a business name for chain comparison.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let without_parens = PARENTHETICAL_RE.replace_all(&lower, " ");
    let without_suffix = BRANCH_SUFFIX_RE.replace(&without_parens, "");
    let without_branch_words = BRANCH_WORD_RE.replace_all(&without_suffix, " ");
    let cleaned = NON_WORD_RE.replace_all(&without_branch_words, "");

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let kept = strip_city_words(&words);
    // Never normalize a name away entirely.
    let result = if kept.is_empty() { words } else { kept };
    result.join(" ")
}

/// Drop trailing words that form a known city name.
fn strip_city_words<'a>(words: &[&'a str]) -> Vec<&'a str> {
    let mut end = words.len();
    'outer: while end > 0 {
        // Try the longest city name ending at `end` first (up to 3 words).
        for start in end.saturating_sub(3)..end {
            let candidate = words[start..end].join(" ");
            if regions::is_known_city(&candidate) {
                end = start;
                continue 'outer;
            }
        }
        break;
    }
    words[..end].to_vec()
}

/// Return the set of normalized names that look like chains.
pub fn detect_chains(listings: &[Listing]) -> HashSet<String> {
    // normalized name -> (search location -> occurrences)
    let mut seen: HashMap<String, HashMap<&str, usize>> = HashMap::new();

    for listing in listings {
        let key = normalize_name(&listing.name);
        if key.is_empty() {
            continue;
        }
        let location = listing.search_location.as_deref().unwrap_or("");
        *seen.entry(key).or_default().entry(location).or_default() += 1;
    }

    seen.into_iter()
        .filter(|(_, per_location)| {
            per_location.len() >= MIN_LOCATIONS
                || per_location
                    .values()
                    .any(|&count| count >= MIN_REPEATS_WITHIN_LOCATION)
        })
        .map(|(name, _)| name)
        .collect()
}

/// Whether `listing` belongs to one of the detected `chains`.
pub fn is_chain(listing: &Listing, chains: &HashSet<String>) -> bool {
    chains.contains(&normalize_name(&listing.name))
}
