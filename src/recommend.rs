//! College recommendation scoring
//!
//! The quiz form posts `{branch, max_fees}` and renders the returned colleges
//! as cards. Scoring is a flat sum of two bonuses, so ties are common; the
//! sort is stable and keeps catalog order among equals.

use serde::{Deserialize, Serialize};

/// Score for offering the requested branch
pub const BRANCH_MATCH_SCORE: u32 = 50;
/// Score for fitting the fee budget
pub const WITHIN_BUDGET_SCORE: u32 = 30;
/// Budget used when the request gives none
pub const DEFAULT_MAX_FEES: u64 = 9_999_999;
/// Colleges returned per request
pub const MAX_RESULTS: usize = 10;

/// A college card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Annual fees
    #[serde(default)]
    pub fees: Option<u64>,
    #[serde(default)]
    pub branches: Vec<String>,
}

impl College {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            location: None,
            fees: None,
            branches: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_fees(mut self, fees: u64) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Set branches from comma-separated text ("CSE,IT,EEE")
    pub fn with_branches(mut self, branches: &str) -> Self {
        self.branches = parse_branches(branches);
        self
    }
}

/// Split comma-separated branch text, dropping empty items
pub fn parse_branches(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

/// Form payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub max_fees: Option<u64>,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub results: Vec<College>,
}

/// Score one college against a request
pub fn score(college: &College, request: &RecommendRequest) -> u32 {
    let mut score = 0;

    // Substring match against the joined list, so "cse" also hits "CSE-Cyber"
    let branch = request.branch.trim().to_lowercase();
    if !branch.is_empty() && college.branches.join(",").to_lowercase().contains(&branch) {
        score += BRANCH_MATCH_SCORE;
    }

    // Zero or missing fees never count as within budget
    let max_fees = request.max_fees.filter(|&f| f > 0).unwrap_or(DEFAULT_MAX_FEES);
    if college.fees.is_some_and(|fees| fees > 0 && fees <= max_fees) {
        score += WITHIN_BUDGET_SCORE;
    }

    score
}

/// Rank `colleges` for `request` and keep the top [`MAX_RESULTS`]
pub fn recommend(colleges: &[College], request: &RecommendRequest) -> RecommendResponse {
    let mut scored: Vec<(u32, &College)> = colleges.iter().map(|c| (score(c, request), c)).collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    log::debug!(
        "Ranked {} colleges for branch '{}' (top score {})",
        scored.len(),
        request.branch,
        scored.first().map(|s| s.0).unwrap_or(0)
    );
    RecommendResponse {
        results: scored
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(_, c)| c.clone())
            .collect(),
    }
}
