//! Franchise qualification scoring.
//!
//! A listing is rejected outright when it matches an exclusion list or its
//! review count falls outside `[min_reviews, max_reviews]`. Otherwise it is
//! scored as base + rating band + review band + contact bonuses + keyword
//! bonus, and tiered by fixed thresholds.

use serde::{Deserialize, Serialize};

use super::Listing;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const BASE_SCORE: u32 = 50;

/// `(minimum rating, bonus)`, highest band first.
pub const RATING_BANDS: [(f64, u32); 3] = [(4.5, 20), (4.0, 15), (3.5, 5)];

/// `(minimum review count, bonus)`, highest band first.
pub const REVIEW_BANDS: [(u32, u32); 3] = [(50, 15), (20, 10), (10, 5)];

pub const WEBSITE_BONUS: u32 = 10;
pub const PHONE_BONUS: u32 = 5;
pub const KEYWORD_BONUS: u32 = 5;
pub const MAX_KEYWORD_BONUS: u32 = 15;

pub const PREMIUM_THRESHOLD: u32 = 85;
pub const STANDARD_THRESHOLD: u32 = 70;
pub const BASIC_THRESHOLD: u32 = 60;

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Tunable qualification rules. Every field has a default so a config file
/// may override only what it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FranchiseCriteria {
    pub min_reviews: u32,
    pub max_reviews: u32,
    /// Known chain names (lowercase substrings of the listing name).
    pub exclude_chains: Vec<String>,
    /// Disqualifying words matched against the name and place types.
    pub exclude_keywords: Vec<String>,
    /// Words that suggest an owner-operated business.
    pub bonus_keywords: Vec<String>,
}

impl Default for FranchiseCriteria {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            min_reviews: 5,
            max_reviews: 2_000,
            exclude_chains: strings(&[
                "7-eleven",
                "ministop",
                "familymart",
                "alfamart",
                "jollibee",
                "mcdonald",
                "chowking",
                "mang inasal",
                "mercury drug",
                "watsons",
                "puregold",
                "savemore",
                "robinsons",
                "sm hypermarket",
                "ace hardware",
                "citi hardware",
                "wilcon",
            ]),
            exclude_keywords: strings(&[
                "bank",
                "church",
                "school",
                "hospital",
                "government",
                "municipal",
                "barangay hall",
                "franchise",
            ]),
            bonus_keywords: strings(&[
                "hardware",
                "trading",
                "enterprises",
                "general merchandise",
                "sari-sari",
                "store",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    /// Tier for a score, or `None` below the qualification threshold.
    pub fn for_score(score: u32) -> Option<Self> {
        if score >= PREMIUM_THRESHOLD {
            Some(Self::Premium)
        } else if score >= STANDARD_THRESHOLD {
            Some(Self::Standard)
        } else if score >= BASIC_THRESHOLD {
            Some(Self::Basic)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Standard => "Standard",
            Self::Premium => "Premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    ExcludedChain { matched: String },
    ExcludedKeyword { matched: String },
    TooFewReviews { count: u32, min: u32 },
    TooManyReviews { count: u32, max: u32 },
    LowScore { score: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Qualified { score: u32, tier: Tier },
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Qualified { .. })
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Apply exclusions, review bounds and tier thresholds to a listing.
pub fn evaluate(listing: &Listing, criteria: &FranchiseCriteria) -> Verdict {
    if let Some(rejection) = exclusion(listing, criteria) {
        return Verdict::Rejected(rejection);
    }

    if listing.review_count < criteria.min_reviews {
        return Verdict::Rejected(Rejection::TooFewReviews {
            count: listing.review_count,
            min: criteria.min_reviews,
        });
    }
    if listing.review_count > criteria.max_reviews {
        return Verdict::Rejected(Rejection::TooManyReviews {
            count: listing.review_count,
            max: criteria.max_reviews,
        });
    }

    let score = score(listing, criteria);
    match Tier::for_score(score) {
        Some(tier) => Verdict::Qualified { score, tier },
        None => Verdict::Rejected(Rejection::LowScore { score }),
    }
}

/// The raw weighted score, ignoring exclusions and review bounds.
pub fn score(listing: &Listing, criteria: &FranchiseCriteria) -> u32 {
    let rating = listing.rating.unwrap_or(0.0);
    let rating_bonus = RATING_BANDS
        .iter()
        .find(|(min, _)| rating >= *min)
        .map_or(0, |(_, bonus)| *bonus);

    let review_bonus = REVIEW_BANDS
        .iter()
        .find(|(min, _)| listing.review_count >= *min)
        .map_or(0, |(_, bonus)| *bonus);

    let name = listing.name.to_lowercase();
    let keyword_hits = criteria
        .bonus_keywords
        .iter()
        .filter(|kw| name.contains(&kw.to_lowercase()))
        .count() as u32;
    let keyword_bonus = (keyword_hits * KEYWORD_BONUS).min(MAX_KEYWORD_BONUS);

    let mut total = BASE_SCORE + rating_bonus + review_bonus + keyword_bonus;
    if listing.has_website() {
        total += WEBSITE_BONUS;
    }
    if listing.has_phone() {
        total += PHONE_BONUS;
    }
    total
}

fn exclusion(listing: &Listing, criteria: &FranchiseCriteria) -> Option<Rejection> {
    let name = listing.name.to_lowercase();

    if let Some(chain) = criteria
        .exclude_chains
        .iter()
        .find(|chain| name.contains(&chain.to_lowercase()))
    {
        return Some(Rejection::ExcludedChain {
            matched: chain.clone(),
        });
    }

    let types: Vec<String> = listing.types.iter().map(|t| t.to_lowercase()).collect();
    criteria
        .exclude_keywords
        .iter()
        .find(|kw| {
            let kw = kw.to_lowercase();
            name.contains(&kw) || types.iter().any(|t| t.contains(&kw))
        })
        .map(|kw| Rejection::ExcludedKeyword { matched: kw.clone() })
}
