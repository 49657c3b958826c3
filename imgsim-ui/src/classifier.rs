//! Similarity tier classification
//!
//! Maps a score to a display tier. Tiers drive presentation only: they never
//! reorder or filter results. Threshold filtering is done by the service,
//! and `total_found` must keep matching what the service counted.

use imgsim_common::api::{Metadata, SearchResultItem};
use serde::Serialize;

/// Display tier, ordered by quality (`Poor < Fair < Good < Excellent`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Tier {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Excellent => "Excellent",
            Tier::Good => "Good",
            Tier::Fair => "Fair",
            Tier::Poor => "Poor",
        }
    }
}

/// Lower bound (inclusive) of each tier
const EXCELLENT_MIN: f64 = 0.9;
const GOOD_MIN: f64 = 0.7;
const FAIR_MIN: f64 = 0.5;

/// Classify a similarity score
///
/// Total over all `f64`: NaN classifies as [`Tier::Poor`].
pub fn classify(score: f64) -> Tier {
    if score >= EXCELLENT_MIN {
        Tier::Excellent
    } else if score >= GOOD_MIN {
        Tier::Good
    } else if score >= FAIR_MIN {
        Tier::Fair
    } else {
        Tier::Poor
    }
}

/// A search hit paired with its derived tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedResult {
    /// 1-based position in the service's ranking
    pub rank: usize,
    pub image_id: String,
    pub score: f64,
    pub tier: Tier,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Classify every result, keeping the service's order
pub fn classify_results(results: &[SearchResultItem]) -> Vec<ClassifiedResult> {
    results
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let tier = classify(item.score);
            ClassifiedResult {
                rank: i + 1,
                image_id: item.image_id.clone(),
                score: item.score,
                tier,
                label: tier.label(),
                metadata: item.metadata.clone(),
            }
        })
        .collect()
}
