//! Synthetic population and daily event streams.
//!
//! Residents live in houses set back 20–60 m from the corridor and commute
//! to a business park at its east end.  Through traffic (cars in both
//! directions, freight eastbound) runs all day.  Everything is drawn from a
//! [`ScenarioRng`], so a seed reproduces the same days.

use nz_core::{Coord, LocationId, PersonId, ScenarioRng, SimTime, VehicleClass, VehicleId};
use nz_events::{ActivityEvent, SimEvent, VehicleMoved};
use nz_spatial::LocationRegistry;

use crate::network::{LENGTH_M, SEGMENT_M, SEGMENTS, backward, forward, segment_of};

const DAY_SECS:           u64 = 86_400;
const WORKPLACES:         u32 = 3;
const THROUGH_CARS:       u32 = 150;
const FREIGHT:            u32 = 40;
const FIRST_THROUGH_ID:   u32 = 10_000;
const FIRST_FREIGHT_ID:   u32 = 20_000;

struct Resident {
    person: PersonId,
    home:   LocationId,
    home_x: f64,
    work:   LocationId,
}

/// Residents and the locations they use.
pub struct Population {
    pub locations: LocationRegistry,
    residents:     Vec<Resident>,
}

impl Population {
    pub fn generate(rng: &mut ScenarioRng, persons: u32) -> Self {
        let mut locations = LocationRegistry::new();
        for w in 0..WORKPLACES {
            locations.insert(workplace(w), Coord::new(LENGTH_M, 40.0 + 30.0 * w as f64));
        }

        let residents = (0..persons)
            .map(|p| {
                let home = LocationId(p);
                let home_x = rng.gen_range(0.0..LENGTH_M * 0.9);
                let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                locations.insert(home, Coord::new(home_x, side * rng.gen_range(20.0..60.0)));
                Resident {
                    person: PersonId(p),
                    home,
                    home_x,
                    work: workplace(rng.gen_range(0..WORKPLACES)),
                }
            })
            .collect();

        Self { locations, residents }
    }

    pub fn len(&self) -> usize {
        self.residents.len()
    }

    /// One simulated day, sorted by time.
    pub fn day_events(&self, rng: &mut ScenarioRng) -> Vec<SimEvent> {
        let mut events = Vec::new();

        for r in &self.residents {
            let car = VehicleId(r.person.0);
            let speed = rng.gen_range(40.0..55.0) / 3.6;
            let first = segment_of(r.home_x);

            let leave_home = rng.gen_range(23_400..30_600);
            events.push(SimEvent::ActivityEnded(activity(r.person, r.home, "home", leave_home)));
            let arrive = drive(&mut events, car, VehicleClass::Car, speed, leave_home, (first..SEGMENTS).map(forward));
            events.push(SimEvent::ActivityStarted(activity(r.person, r.work, "work", arrive)));

            let leave_work = arrive + rng.gen_range(28_800..32_400);
            events.push(SimEvent::ActivityEnded(activity(r.person, r.work, "work", leave_work)));
            let home_again =
                drive(&mut events, car, VehicleClass::Car, speed, leave_work, (first..SEGMENTS).rev().map(backward));
            events.push(SimEvent::ActivityStarted(activity(r.person, r.home, "home", home_again)));
        }

        for k in 0..THROUGH_CARS {
            let car = VehicleId(FIRST_THROUGH_ID + k);
            let start = rng.gen_range(18_000..DAY_SECS - 1_800);
            let speed = rng.gen_range(45.0..60.0) / 3.6;
            if rng.gen_bool(0.5) {
                drive(&mut events, car, VehicleClass::Car, speed, start, (0..SEGMENTS).map(forward));
            } else {
                drive(&mut events, car, VehicleClass::Car, speed, start, (0..SEGMENTS).rev().map(backward));
            }
        }

        for k in 0..FREIGHT {
            let truck = VehicleId(FIRST_FREIGHT_ID + k);
            let start = rng.gen_range(0..DAY_SECS - 1_800);
            let speed = rng.gen_range(40.0..50.0) / 3.6;
            drive(&mut events, truck, VehicleClass::Hgv, speed, start, (0..SEGMENTS).map(forward));
        }

        events.sort_by_key(SimEvent::time);
        events
    }
}

fn workplace(w: u32) -> LocationId {
    LocationId(1_000_000 + w)
}

fn activity(person: PersonId, location: LocationId, activity_type: &str, secs: u64) -> ActivityEvent {
    ActivityEvent { person, location, activity_type: activity_type.into(), time: SimTime(secs) }
}

/// Push one passage per link; returns the arrival time.
fn drive(
    events:    &mut Vec<SimEvent>,
    vehicle:   VehicleId,
    class:     VehicleClass,
    speed_mps: f64,
    depart:    u64,
    links:     impl Iterator<Item = nz_core::LinkId>,
) -> u64 {
    let per_link = (SEGMENT_M / speed_mps).round() as u64;
    let mut t = depart;
    for link in links {
        events.push(SimEvent::VehicleMoved(VehicleMoved {
            link,
            vehicle,
            time: SimTime(t),
            speed_mps,
            class,
        }));
        t += per_link;
    }
    t
}
