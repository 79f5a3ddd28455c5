//! The `NoisePipeline` struct and its lifecycle hooks.

use nz_activity::ActivityTracker;
use nz_core::{BinClock, Coord, NoiseConfig};
use nz_damage::{DamageError, DamageTotals, DoseResponse, calculate_noise_damage_costs};
use nz_emission::{EmissionAggregator, EmissionModel};
use nz_events::{CostSink, EventKind, EventRegistry, SimEvent};
use nz_immission::{AttenuationModel, calculate_noise_immission};
use nz_spatial::{Network, ReceiverGrid};

use crate::{IterationSummary, PipelineError, PipelineObserver, PipelineResult, PipelineState};

/// Subscribers in the event registration table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Emission,
    Activity,
}

/// Per-iteration routing counters.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct EventCounts {
    vehicle:  u64,
    activity: u64,
    skipped:  u64,
}

// ── NoisePipeline ─────────────────────────────────────────────────────────────

/// The iteration orchestrator.
///
/// Owns the receiver grid, both collecting trackers and the injected models,
/// and drives one outer-simulation day at a time through the lifecycle hooks:
///
/// 1. [`startup`](Self::startup) — once; builds the receiver grid.
/// 2. [`before_day`](Self::before_day) — clears all per-iteration state.
/// 3. [`handle_event`](Self::handle_event) — for every event of the day.
/// 4. [`after_day`](Self::after_day) — emission, immission, exposure and
///    damage stages, strictly in that order; cost events go to the sink.
/// 5. [`iteration_end`](Self::iteration_end) — summary and anomaly report.
///
/// Hooks called out of order return [`PipelineError::InvalidTransition`].
/// A fatal error during `after_day` moves the pipeline to `Aborted`.
///
/// Create via [`PipelineBuilder`][crate::PipelineBuilder].
pub struct NoisePipeline {
    pub(crate) config:          NoiseConfig,
    pub(crate) clock:           BinClock,
    pub(crate) network:         Network,
    pub(crate) receiver_points: Option<Vec<Coord>>,
    /// `None` until `startup`.
    pub(crate) grid:            Option<ReceiverGrid>,
    pub(crate) emission:        EmissionAggregator,
    pub(crate) activity:        ActivityTracker,
    pub(crate) emission_model:  Box<dyn EmissionModel>,
    pub(crate) attenuation:     Box<dyn AttenuationModel>,
    pub(crate) dose_response:   Box<dyn DoseResponse>,
    pub(crate) registry:        EventRegistry<Stage>,
    pub(crate) state:           PipelineState,
    pub(crate) iteration:       u32,
    pub(crate) counts:          EventCounts,
    pub(crate) last_totals:     Option<DamageTotals>,
}

impl NoisePipeline {
    // ── Access ────────────────────────────────────────────────────────────

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    pub fn clock(&self) -> &BinClock {
        &self.clock
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The receiver grid; `None` before `startup`.
    pub fn grid(&self) -> Option<&ReceiverGrid> {
        self.grid.as_ref()
    }

    pub fn emission(&self) -> &EmissionAggregator {
        &self.emission
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Damage totals of the most recent `after_day`.
    pub fn last_totals(&self) -> Option<&DamageTotals> {
        self.last_totals.as_ref()
    }

    // ── Lifecycle hooks ───────────────────────────────────────────────────

    fn expect_state(&self, hook: &'static str, allowed: &[PipelineState]) -> PipelineResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition { hook, state: self.state })
        }
    }

    /// Build the receiver grid, register stage subscriptions and export the
    /// grid.  `Uninitialized → Ready`.
    pub fn startup<O: PipelineObserver>(&mut self, observer: &mut O) -> PipelineResult<()> {
        self.expect_state("startup", &[PipelineState::Uninitialized])?;
        tracing::info!("noise startup");

        #[cfg(feature = "parallel")]
        if let Some(n) = self.config.run.parallel_threads {
            if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
                tracing::warn!(threads = n, error = %e, "rayon pool already initialised");
            }
        }

        let built = match self.receiver_points.take() {
            Some(points) => ReceiverGrid::from_points(&self.network, points, self.config.grid.hearing_radius_m),
            None => ReceiverGrid::build(&self.network, &self.config.grid),
        };
        let grid = match built {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(stage = "grid", error = %e, "noise pipeline aborted");
                self.state = PipelineState::Aborted;
                return Err(e.into());
            }
        };

        self.registry.register(EventKind::VehicleMoved, Stage::Emission);
        self.registry.register(EventKind::ActivityStarted, Stage::Activity);
        self.registry.register(EventKind::ActivityEnded, Stage::Activity);

        observer.on_grid_ready(&grid);
        self.grid = Some(grid);
        self.state = PipelineState::Ready;
        tracing::info!("noise startup done");
        Ok(())
    }

    /// Clear every receiver and both trackers.  `Ready | Reported → Collecting`.
    pub fn before_day(&mut self, iteration: u32) -> PipelineResult<()> {
        self.expect_state("before_day", &[PipelineState::Ready, PipelineState::Reported])?;

        if let Some(grid) = self.grid.as_mut() {
            grid.reset();
        }
        self.emission.reset();
        self.activity.reset();
        self.registry.reset_sequence();
        self.counts = EventCounts::default();
        self.last_totals = None;

        self.iteration = iteration;
        self.state = PipelineState::Collecting;
        tracing::info!(iteration, "noise collection started");
        Ok(())
    }

    /// Route one outer-simulation event to its subscribed stages.
    pub fn handle_event(&mut self, event: &SimEvent) -> PipelineResult<()> {
        self.expect_state("handle_event", &[PipelineState::Collecting])?;

        let (seq, subscribers) = self.registry.route(event);
        let mut accepted = false;
        for stage in subscribers {
            accepted |= match (stage, event) {
                (Stage::Emission, SimEvent::VehicleMoved(e)) => self.emission.record_vehicle_event(e, seq),
                (Stage::Activity, SimEvent::ActivityStarted(e)) => self.activity.record_activity_start(e),
                (Stage::Activity, SimEvent::ActivityEnded(e)) => self.activity.record_activity_end(e),
                _ => false,
            };
        }

        match (accepted, event.kind()) {
            (false, _)                     => self.counts.skipped += 1,
            (true, EventKind::VehicleMoved) => self.counts.vehicle += 1,
            (true, _)                      => self.counts.activity += 1,
        }
        Ok(())
    }

    /// Run every stage for the collected day and emit cost events to `sink`.
    /// `Collecting → Computing`.
    ///
    /// On a fatal stage error the pipeline moves to `Aborted` and the error is
    /// returned.
    pub fn after_day<S: CostSink, O: PipelineObserver>(
        &mut self,
        sink:     &mut S,
        observer: &mut O,
    ) -> PipelineResult<()> {
        self.expect_state("after_day", &[PipelineState::Collecting])?;
        self.state = PipelineState::Computing;
        tracing::info!(iteration = self.iteration, "noise computation started");

        match self.compute(sink, observer) {
            Ok(totals) => {
                self.last_totals = Some(totals);
                tracing::info!(iteration = self.iteration, "noise computation done");
                Ok(())
            }
            Err((stage, e)) => {
                tracing::error!(iteration = self.iteration, stage, error = %e, "noise pipeline aborted");
                self.state = PipelineState::Aborted;
                Err(e)
            }
        }
    }

    /// The four stages.  Each completes for all links/receivers before the
    /// next starts.
    fn compute<S: CostSink, O: PipelineObserver>(
        &mut self,
        sink:     &mut S,
        observer: &mut O,
    ) -> Result<DamageTotals, (&'static str, PipelineError)> {
        let clock = self.clock;
        let iteration = self.iteration;
        let Some(grid) = self.grid.as_mut() else {
            return Err(("grid", PipelineError::StageOrder {
                stage:  "after_day",
                detail: "receiver grid has not been built".into(),
            }));
        };

        // ── Emission ──────────────────────────────────────────────────────
        let levels = self.emission.compute_emission_levels(self.emission_model.as_ref());
        observer.on_emissions(iteration, &levels);

        // ── Immission ─────────────────────────────────────────────────────
        calculate_noise_immission(grid, &levels, self.attenuation.as_ref(), &clock);

        // ── Exposure ──────────────────────────────────────────────────────
        self.activity.assign_to_receivers(grid);

        // ── Damage ────────────────────────────────────────────────────────
        let totals = calculate_noise_damage_costs(
            grid,
            &levels,
            self.dose_response.as_ref(),
            &self.config.damage,
            &clock,
            sink,
        )
        .map_err(|e| match e {
            DamageError::StageOrder { receiver, bin } => ("damage", PipelineError::StageOrder {
                stage:  "damage",
                detail: format!("no immission level for {receiver} in {bin}"),
            }),
            DamageError::NonFinite { .. } => {
                ("damage", PipelineError::NonFinite { stage: "damage", what: "damage cost" })
            }
            DamageError::NonFiniteTotal => {
                ("damage", PipelineError::NonFinite { stage: "damage", what: "total damage" })
            }
            other => ("damage", other.into()),
        })?;

        observer.on_immissions(iteration, grid, &clock);
        Ok(totals)
    }

    /// Log totals and the anomaly summary and export them.
    /// `Computing → Reported`.
    pub fn iteration_end<O: PipelineObserver>(&mut self, observer: &mut O) -> PipelineResult<IterationSummary> {
        self.expect_state("iteration_end", &[PipelineState::Computing])?;

        let summary = IterationSummary {
            iteration:       self.iteration,
            vehicle_events:  self.counts.vehicle,
            activity_events: self.counts.activity,
            skipped_events:  self.counts.skipped,
            anomalies:       self.emission.anomalies().total() + self.activity.anomalies().total(),
            totals:          self.last_totals.unwrap_or_default(),
        };

        tracing::info!(
            iteration = summary.iteration,
            damage = summary.totals.total_damage,
            caused = summary.totals.caused_total,
            affected = summary.totals.affected_total,
            caused_events = summary.totals.caused_events,
            affected_events = summary.totals.affected_events,
            "noise iteration totals"
        );
        self.emission.anomalies().log_summary();
        self.activity.anomalies().log_summary();

        observer.on_iteration_end(&summary);
        self.state = PipelineState::Reported;
        Ok(summary)
    }

    /// `before_day`, every event, `after_day`, `iteration_end`.
    pub fn run_iteration<'a, I, S, O>(
        &mut self,
        iteration: u32,
        events:    I,
        sink:      &mut S,
        observer:  &mut O,
    ) -> PipelineResult<IterationSummary>
    where
        I: IntoIterator<Item = &'a SimEvent>,
        S: CostSink,
        O: PipelineObserver,
    {
        self.before_day(iteration)?;
        for event in events {
            self.handle_event(event)?;
        }
        self.after_day(sink, observer)?;
        self.iteration_end(observer)
    }

    /// `true` if no per-iteration state is held anywhere.
    pub fn is_reset(&self) -> bool {
        self.grid.as_ref().is_none_or(ReceiverGrid::is_reset)
            && self.emission.is_reset()
            && self.activity.is_reset()
    }
}
