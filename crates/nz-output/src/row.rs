//! Plain data row types written by output backends.

/// One receiver, written once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceiverRow {
    pub receiver_id:    u32,
    pub x:              f64,
    pub y:              f64,
    /// Number of links within hearing radius.
    pub relevant_links: u32,
}

/// Emission level of one link in one bin with traffic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionRow {
    pub iteration: u32,
    pub link_id:   u32,
    pub bin:       u32,
    pub vehicles:  u32,
    pub hgv_share: f64,
    pub level_db:  f64,
}

/// Immission, exposure and damage of one receiver in one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImmissionRow {
    pub iteration:      u32,
    pub receiver_id:    u32,
    pub bin:            u32,
    pub level_db:       f64,
    pub affected_units: f64,
    pub damage_cost:    f64,
}

/// Totals and counters of one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationSummaryRow {
    pub iteration:       u32,
    pub vehicle_events:  u64,
    pub activity_events: u64,
    pub skipped_events:  u64,
    pub anomalies:       u64,
    pub total_damage:    f64,
    pub caused_total:    f64,
    pub affected_total:  f64,
    pub caused_events:   u64,
    pub affected_events: u64,
}
