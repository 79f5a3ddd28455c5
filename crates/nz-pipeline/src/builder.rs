//! Fluent builder for constructing a [`NoisePipeline`].

use nz_activity::{ActivityTracker, ActivityWeights};
use nz_core::{Coord, NoiseConfig};
use nz_damage::{DoseResponse, PeriodDoseResponse, validate_dose_response};
use nz_emission::{EmissionAggregator, EmissionModel, Rls90};
use nz_events::EventRegistry;
use nz_immission::{AttenuationModel, DistanceAttenuation, validate_attenuation};
use nz_spatial::{LocationRegistry, Network};

use crate::{NoisePipeline, PipelineResult, PipelineState};

/// Fluent builder for [`NoisePipeline`].
///
/// # Required inputs
///
/// - [`NoiseConfig`] — time bins, grid, emission, attenuation, damage, activity
/// - [`Network`] — link geometry
/// - [`LocationRegistry`] — activity location coordinates
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                        |
/// |------------------------|------------------------------------------------|
/// | `.receivers(points)`   | Regular lattice from `[grid]`                  |
/// | `.emission_model(m)`   | `Rls90` with the `[emission]` speed clamps     |
/// | `.attenuation(m)`      | `DistanceAttenuation` from `[attenuation]`     |
/// | `.dose_response(m)`    | `PeriodDoseResponse` from `[damage]`           |
/// | `.activity_weights(w)` | `ActivityWeights` from `[activity]`            |
///
/// `build` validates everything, so configuration errors surface before the
/// first iteration.
///
/// # Example
///
/// ```rust,ignore
/// let mut pipeline = PipelineBuilder::new(config, network, locations).build()?;
/// pipeline.startup(&mut NoopObserver)?;
/// let summary = pipeline.run_iteration(0, &events, &mut sink, &mut NoopObserver)?;
/// ```
pub struct PipelineBuilder {
    config:         NoiseConfig,
    network:        Network,
    locations:      LocationRegistry,
    receivers:      Option<Vec<Coord>>,
    emission_model: Option<Box<dyn EmissionModel>>,
    attenuation:    Option<Box<dyn AttenuationModel>>,
    dose_response:  Option<Box<dyn DoseResponse>>,
    weights:        Option<ActivityWeights>,
}

impl PipelineBuilder {
    pub fn new(config: NoiseConfig, network: Network, locations: LocationRegistry) -> Self {
        Self {
            config,
            network,
            locations,
            receivers:      None,
            emission_model: None,
            attenuation:    None,
            dose_response:  None,
            weights:        None,
        }
    }

    /// Place receivers explicitly instead of on the configured lattice.
    pub fn receivers(mut self, points: Vec<Coord>) -> Self {
        self.receivers = Some(points);
        self
    }

    pub fn emission_model(mut self, model: Box<dyn EmissionModel>) -> Self {
        self.emission_model = Some(model);
        self
    }

    pub fn attenuation(mut self, model: Box<dyn AttenuationModel>) -> Self {
        self.attenuation = Some(model);
        self
    }

    pub fn dose_response(mut self, model: Box<dyn DoseResponse>) -> Self {
        self.dose_response = Some(model);
        self
    }

    /// Use an externally loaded weight table (e.g. from
    /// [`nz_activity::load_weights_csv`]) instead of `[activity]`.
    pub fn activity_weights(mut self, weights: ActivityWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Validate inputs and return a pipeline in `Uninitialized` state.
    pub fn build(self) -> PipelineResult<NoisePipeline> {
        self.config.validate()?;
        let clock = self.config.clock();

        let emission_model: Box<dyn EmissionModel> = match self.emission_model {
            Some(m) => m,
            None => Box::new(Rls90::from_config(&self.config.emission)?),
        };

        let attenuation: Box<dyn AttenuationModel> = match self.attenuation {
            Some(m) => m,
            None => Box::new(DistanceAttenuation::from_config(&self.config.attenuation)?),
        };
        validate_attenuation(attenuation.as_ref())?;

        let dose_response: Box<dyn DoseResponse> = match self.dose_response {
            Some(m) => m,
            None => Box::new(PeriodDoseResponse::from_config(&self.config.damage)?),
        };
        validate_dose_response(dose_response.as_ref(), &clock)?;

        let weights = match self.weights {
            Some(w) => w,
            None => ActivityWeights::from_config(&self.config.activity)?,
        };

        let emission = EmissionAggregator::new(clock, self.config.emission.clone())
            .with_known_links(self.network.links().iter().map(|l| l.id));
        let activity =
            ActivityTracker::new(clock, self.config.emission.scale_factor, weights, self.locations);

        tracing::debug!(%clock, links = self.network.link_count(), "noise pipeline built");

        Ok(NoisePipeline {
            clock,
            config: self.config,
            network: self.network,
            receiver_points: self.receivers,
            grid: None,
            emission,
            activity,
            emission_model,
            attenuation,
            dose_response,
            registry: EventRegistry::new(),
            state: PipelineState::Uninitialized,
            iteration: 0,
            counts: Default::default(),
            last_totals: None,
        })
    }
}
