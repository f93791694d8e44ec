use chrono::{DateTime, Utc};

use crate::core::frames::{self, Geodetic};
use crate::core::orbit::{PropagatedState, PropagationError, PropagationSettings, Sgp4};
use crate::core::time::{JulianDate, Target};
use crate::core::tle::ElementSet;

/// An element set together with its initialised propagator.
///
/// Both halves are immutable, so one `Satellite` can serve any number of
/// concurrent propagation calls behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Satellite {
    elements: ElementSet,
    model: Sgp4,
}

impl Satellite {
    pub fn new(elements: ElementSet, settings: PropagationSettings) -> Self {
        let model = Sgp4::new(&elements, settings);
        Self { elements, model }
    }

    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    pub fn model(&self) -> &Sgp4 {
        &self.model
    }

    pub fn norad_id(&self) -> u32 {
        self.elements.catalog_number()
    }

    pub fn name(&self) -> Option<&str> {
        self.elements.name()
    }

    pub fn propagate(&self, target: Target) -> Result<PropagatedState, PropagationError> {
        self.model.propagate(target.minutes_since(&self.model.epoch()))
    }

    pub fn subpoint(&self, at: DateTime<Utc>) -> Result<Geodetic, PropagationError> {
        let state = self.propagate(Target::Utc(at))?;
        Ok(frames::subpoint(&state, JulianDate::from_utc(at)))
    }
}
