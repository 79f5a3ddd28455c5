//! Affected-agent-unit weights per activity type.
//!
//! # CSV format
//!
//! ```csv
//! activity_type,weight
//! home,1.0
//! work,0.5
//! ```
//!
//! Every type listed in a CSV table is considered.  Use the `[activity]`
//! config section to track a subset.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use nz_core::config::ActivityConfig;

use crate::{ActivityError, ActivityResult};

/// Which activity types count towards exposure, and how much.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityWeights {
    weights:    BTreeMap<String, f64>,
    considered: BTreeSet<String>,
}

impl ActivityWeights {
    /// Consider every type in `weights`.
    ///
    /// # Errors
    ///
    /// `ActivityError::Config` for a negative or non-finite weight.
    pub fn new(weights: impl IntoIterator<Item = (String, f64)>) -> ActivityResult<Self> {
        let weights: BTreeMap<String, f64> = weights.into_iter().collect();
        for (act, w) in &weights {
            check_weight(act, *w)?;
        }
        let considered = weights.keys().cloned().collect();
        Ok(Self { weights, considered })
    }

    /// Build from the `[activity]` section.
    ///
    /// # Errors
    ///
    /// `ActivityError::Core` if a considered type has no weight or a weight is
    /// negative.
    pub fn from_config(config: &ActivityConfig) -> ActivityResult<Self> {
        config.validate()?;
        Ok(Self {
            weights:    config.weights.clone(),
            considered: config.considered.iter().cloned().collect(),
        })
    }

    pub fn is_considered(&self, activity_type: &str) -> bool {
        self.considered.contains(activity_type)
    }

    /// Weight of a considered type; `None` for types that are not tracked.
    pub fn weight(&self, activity_type: &str) -> Option<f64> {
        if self.is_considered(activity_type) {
            self.weights.get(activity_type).copied()
        } else {
            None
        }
    }

    /// Considered types in ascending order.
    pub fn considered(&self) -> impl Iterator<Item = &str> {
        self.considered.iter().map(String::as_str)
    }
}

fn check_weight(activity_type: &str, weight: f64) -> ActivityResult<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ActivityError::Config(format!(
            "activity weight for {activity_type:?} must be >= 0, got {weight}"
        )))
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WeightRecord {
    activity_type: String,
    weight:        f64,
}

/// Load an `activity_type,weight` table from a CSV file.
pub fn load_weights_csv(path: &Path) -> ActivityResult<ActivityWeights> {
    let file = std::fs::File::open(path)?;
    load_weights_reader(file)
}

/// Like [`load_weights_csv`] but accepts any `Read` source.
pub fn load_weights_reader<R: Read>(reader: R) -> ActivityResult<ActivityWeights> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();

    for result in csv_reader.deserialize::<WeightRecord>() {
        let row = result.map_err(|e| ActivityError::Parse(e.to_string()))?;
        let act = row.activity_type.trim().to_owned();
        if weights.insert(act.clone(), row.weight).is_some() {
            return Err(ActivityError::Parse(format!("duplicate activity type {act:?}")));
        }
    }

    ActivityWeights::new(weights)
}
