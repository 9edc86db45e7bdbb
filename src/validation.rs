//! Comparison of a computed timeline against reference samples

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::waterfall::WaterfallResult;

/// Absolute tolerance used when none is given
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

/// Expected values for one period, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedSample {
    #[serde(alias = "indice")]
    pub period: u32,

    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// One field that differs from its reference by more than the tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub period: u32,
    pub field: String,
    pub expected: f64,
    pub actual: f64,
    pub diff: f64,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {} {}: expected {:.6}, got {:.6} (diff {:.6})",
            self.period, self.field, self.expected, self.actual, self.diff
        )
    }
}

/// Record field a reference workbook column maps to
fn record_field(name: &str) -> &str {
    match name {
        "pl_fidc" => "pool_end",
        "pl_senior" => "senior_balance_end",
        "pl_mezz" => "mezz_balance_end",
        "pl_sub_jr" => "junior_balance_end",
        "pmt_senior" => "senior_payment",
        "pmt_mezz" => "mezz_payment",
        "pmt_sub_jr" => "junior_payment",
        other => other,
    }
}

/// Every sampled value further than `tolerance` from the computed one.
///
/// Samples for periods outside the timeline and unknown fields are skipped.
pub fn validate_timeline(
    result: &WaterfallResult,
    samples: &[ExpectedSample],
    tolerance: f64,
) -> Vec<Divergence> {
    let mut divergences = Vec::new();

    for sample in samples {
        let Some(row) = result.timeline.iter().find(|r| r.period == sample.period) else {
            debug!("No period {} in timeline, sample skipped", sample.period);
            continue;
        };

        for (field, &expected) in &sample.values {
            let Some(actual) = row.value_of(record_field(field)) else {
                debug!("Unknown field '{}' in sample for period {}", field, sample.period);
                continue;
            };
            let diff = (expected - actual).abs();
            if diff > tolerance {
                divergences.push(Divergence {
                    period: sample.period,
                    field: field.clone(),
                    expected,
                    actual,
                    diff,
                });
            }
        }
    }

    divergences
}
