use serde::{Deserialize, Serialize};

/// Fixed score bands as `(label, exclusive upper bound)`. The last band is closed at 100.
const BUCKETS: [(&str, f64); 5] = [
    ("0-19", 20.0),
    ("20-39", 40.0),
    ("40-59", 60.0),
    ("60-79", 80.0),
    ("80-100", f64::INFINITY),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBucket {
    pub bucket: String,
    pub count: u64,
}

fn bucket_index(pct: f64) -> usize {
    BUCKETS
        .iter()
        .position(|(_, upper)| pct < *upper)
        .unwrap_or(BUCKETS.len() - 1)
}

/// Count percentages per band. Always returns all five bands in order, zero counts included.
/// Callers filter out undefined percentages before calling.
pub fn bucket(percentages: &[f64]) -> Vec<DistributionBucket> {
    let counts = percentages.iter().fold([0u64; 5], |mut acc, &pct| {
        acc[bucket_index(pct)] += 1;
        acc
    });

    BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| DistributionBucket {
            bucket: (*label).to_string(),
            count,
        })
        .collect()
}
