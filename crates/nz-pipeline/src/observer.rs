//! Pipeline observer trait for statistics export.

use nz_core::BinClock;
use nz_damage::DamageTotals;
use nz_emission::EmissionLevels;
use nz_spatial::ReceiverGrid;

/// Counts and totals of one finished iteration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IterationSummary {
    pub iteration:       u32,
    /// Vehicle movements accepted by the emission stage.
    pub vehicle_events:  u64,
    /// Activity starts and ends accepted by the activity stage.
    pub activity_events: u64,
    /// Events rejected as anomalies or not considered.
    pub skipped_events:  u64,
    /// Anomalies reported during the iteration.
    pub anomalies:       u64,
    pub totals:          DamageTotals,
}

/// Callbacks invoked by [`NoisePipeline`][crate::NoisePipeline] at each
/// stage boundary.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait PipelineObserver {
    /// Called once by `startup` after the receiver grid is built.
    fn on_grid_ready(&mut self, _grid: &ReceiverGrid) {}

    /// Called after the emission stage.
    fn on_emissions(&mut self, _iteration: u32, _levels: &EmissionLevels) {}

    /// Called after the damage stage, with immission, exposure and damage
    /// filled in for every receiver and bin.
    fn on_immissions(&mut self, _iteration: u32, _grid: &ReceiverGrid, _clock: &BinClock) {}

    /// Called by `iteration_end`.
    fn on_iteration_end(&mut self, _summary: &IterationSummary) {}
}

/// A [`PipelineObserver`] that does nothing.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
