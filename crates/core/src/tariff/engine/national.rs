use crate::tariff::engine::DistributionEngine;
use crate::tariff::registry::{CoverageProfile, FieldworkModel, RegionRegistry};
use crate::tariff::selector::CoverageMode;

/// All fourteen departments, urban and rural cells.
pub struct NationalEngine<'a> {
    registry: &'a RegionRegistry,
}

impl<'a> NationalEngine<'a> {
    pub fn new(registry: &'a RegionRegistry) -> Self {
        Self { registry }
    }
}

impl DistributionEngine for NationalEngine<'_> {
    fn mode(&self) -> CoverageMode {
        CoverageMode::National
    }

    fn profile(&self) -> &CoverageProfile {
        &self.registry.national
    }

    fn model(&self) -> &FieldworkModel {
        &self.registry.model
    }
}
