//! Disease breakdown shaping
//!
//! Turns the name-count aggregation into a percentage breakdown for the
//! dashboard. With the bucketed policy, names outside the known set are
//! folded into an "Other" slice so a noisy model cannot flood the chart.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::repository::NameCountRow;

/// Disease names that get their own slice under the bucketed policy
pub const KNOWN_DISEASES: [&str; 4] = ["Rust", "Blight", "Powdery Mildew", "Leaf Spot"];

pub const OTHER_BUCKET: &str = "Other";

/// How unknown disease names are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownPolicy {
    /// Every distinct name gets its own slice
    Flat,
    /// Names outside KNOWN_DISEASES fold into "Other"
    OtherBucket,
}

impl BreakdownPolicy {
    pub fn from_env_value(value: &str) -> Self {
        match value {
            "flat" => Self::Flat,
            _ => Self::OtherBucket,
        }
    }
}

impl Default for BreakdownPolicy {
    fn default() -> Self {
        Self::OtherBucket
    }
}

/// One slice of the breakdown chart
#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct DiseaseSlice {
    pub name: String,
    pub count: u64,
    /// Share of all detections, rounded to one decimal place
    pub percentage: f64,
}

fn round_1dp(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Shape name counts into percentage slices, largest first.
/// An empty input yields an empty breakdown rather than NaN percentages.
pub fn build_breakdown(rows: &[NameCountRow], policy: BreakdownPolicy) -> Vec<DiseaseSlice> {
    let total: u64 = rows.iter().map(|r| r.count.max(0) as u64).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut slices: Vec<DiseaseSlice> = Vec::new();
    let mut other: u64 = 0;

    for row in rows {
        let count = row.count.max(0) as u64;
        if count == 0 {
            continue;
        }
        let bucketed = policy == BreakdownPolicy::OtherBucket
            && !KNOWN_DISEASES.contains(&row.name.as_str());
        if bucketed {
            other += count;
        } else if let Some(existing) = slices.iter_mut().find(|s| s.name == row.name) {
            existing.count += count;
        } else {
            slices.push(DiseaseSlice {
                name: row.name.clone(),
                count,
                percentage: 0.0,
            });
        }
    }

    if other > 0 {
        slices.push(DiseaseSlice {
            name: OTHER_BUCKET.to_string(),
            count: other,
            percentage: 0.0,
        });
    }

    for slice in &mut slices {
        slice.percentage = round_1dp(slice.count as f64 * 100.0 / total as f64);
    }
    // "Other" renders last regardless of size; named slices sort by
    // count, then name for a stable chart order
    slices.sort_by(|a, b| {
        let a_other = a.name == OTHER_BUCKET;
        let b_other = b.name == OTHER_BUCKET;
        a_other
            .cmp(&b_other)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.name.cmp(&b.name))
    });
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, count: i64) -> NameCountRow {
        NameCountRow {
            name: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_flat_policy_keeps_every_name() {
        let rows = vec![row("Rust", 3), row("Mosaic Virus", 1)];
        let slices = build_breakdown(&rows, BreakdownPolicy::Flat);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Rust");
        assert_eq!(slices[0].percentage, 75.0);
        assert_eq!(slices[1].name, "Mosaic Virus");
        assert_eq!(slices[1].percentage, 25.0);
    }

    #[test]
    fn test_unknown_names_fold_into_other() {
        let rows = vec![
            row("Rust", 4),
            row("Mosaic Virus", 2),
            row("Canker", 2),
        ];
        let slices = build_breakdown(&rows, BreakdownPolicy::OtherBucket);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Rust");
        assert_eq!(slices[0].count, 4);
        assert_eq!(slices[1].name, "Other");
        assert_eq!(slices[1].count, 4);
        assert_eq!(slices[1].percentage, 50.0);
    }

    #[test]
    fn test_other_sorts_last_even_when_largest() {
        let rows = vec![row("Rust", 1), row("Canker", 5), row("Mosaic Virus", 4)];
        let slices = build_breakdown(&rows, BreakdownPolicy::OtherBucket);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "Rust");
        assert_eq!(slices[1].name, "Other");
        assert_eq!(slices[1].count, 9);
    }

    #[test]
    fn test_known_names_never_bucketed() {
        let rows = vec![
            row("Rust", 1),
            row("Blight", 1),
            row("Powdery Mildew", 1),
            row("Leaf Spot", 1),
        ];
        let slices = build_breakdown(&rows, BreakdownPolicy::OtherBucket);
        assert_eq!(slices.len(), 4);
        assert!(slices.iter().all(|s| s.name != "Other"));
        assert!(slices.iter().all(|s| s.percentage == 25.0));
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        let rows = vec![row("Rust", 1), row("Blight", 2)];
        let slices = build_breakdown(&rows, BreakdownPolicy::Flat);
        // 1/3 and 2/3
        assert_eq!(slices[0].percentage, 66.7);
        assert_eq!(slices[1].percentage, 33.3);
    }

    #[test]
    fn test_empty_input_yields_empty_breakdown() {
        assert!(build_breakdown(&[], BreakdownPolicy::Flat).is_empty());
        assert!(build_breakdown(&[], BreakdownPolicy::OtherBucket).is_empty());
    }

    #[test]
    fn test_percentages_sum_near_100() {
        let rows = vec![
            row("Rust", 7),
            row("Blight", 11),
            row("Leaf Spot", 3),
            row("Canker", 5),
        ];
        for policy in [BreakdownPolicy::Flat, BreakdownPolicy::OtherBucket] {
            let slices = build_breakdown(&rows, policy);
            let sum: f64 = slices.iter().map(|s| s.percentage).sum();
            assert!((sum - 100.0).abs() < 0.5, "sum was {sum}");
        }
    }

    #[test]
    fn test_policy_from_env_value() {
        assert_eq!(BreakdownPolicy::from_env_value("flat"), BreakdownPolicy::Flat);
        assert_eq!(
            BreakdownPolicy::from_env_value("other_bucket"),
            BreakdownPolicy::OtherBucket
        );
        assert_eq!(BreakdownPolicy::from_env_value(""), BreakdownPolicy::OtherBucket);
    }
}
