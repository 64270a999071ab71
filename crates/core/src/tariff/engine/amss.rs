use rust_decimal::Decimal;

use crate::domain::distribution::{ProductivityBasis, RegionRow};
use crate::domain::inputs::QuotationInputs;
use crate::domain::region::Region;
use crate::errors::QuotationError;
use crate::tariff::engine::{raw_field_days, Allocation, DistributionEngine};
use crate::tariff::registry::{CoverageProfile, FieldworkModel, RegionRegistry};
use crate::tariff::rounding::{guarded_div, round2};
use crate::tariff::selector::CoverageMode;

/// San Salvador metropolitan area: one flat-rate region staffed with the caller's own team.
pub struct AmssEngine<'a> {
    registry: &'a RegionRegistry,
}

impl<'a> AmssEngine<'a> {
    pub fn new(registry: &'a RegionRegistry) -> Self {
        Self { registry }
    }

    fn region(&self) -> Region {
        self.profile().regions.first().map(|profile| profile.region).unwrap_or(Region::SanSalvador)
    }
}

impl DistributionEngine for AmssEngine<'_> {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Amss
    }

    fn profile(&self) -> &CoverageProfile {
        &self.registry.amss
    }

    fn model(&self) -> &FieldworkModel {
        &self.registry.model
    }

    fn allocate(&self, inputs: &QuotationInputs) -> Result<Allocation, QuotationError> {
        let adjusted_total = self.adjusted_total(inputs.total_interviews);
        let urban = if inputs.mode.is_online() {
            self.online_count(adjusted_total)
        } else {
            adjusted_total
        };
        Ok(Allocation { adjusted_total, rows: vec![RegionRow::allocated(self.region(), urban, 0)] })
    }

    /// Whole interviews only.
    fn row_productivity(&self, basis: &ProductivityBasis, minutes_per_day: Decimal) -> Decimal {
        let segments_per_day = guarded_div(minutes_per_day, basis.segment_minutes);
        (segments_per_day * Decimal::from(basis.segment_size) / Decimal::from(basis.groups.max(1)))
            .floor()
    }

    fn staffing(
        &self,
        inputs: &QuotationInputs,
        _basis: &ProductivityBasis,
        rows: Vec<RegionRow>,
    ) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| RegionRow {
                fieldworkers: inputs.fieldworkers,
                supervisors: inputs.supervisors,
                ..row
            })
            .collect()
    }

    fn row_field_days(
        &self,
        basis: &ProductivityBasis,
        total: u32,
        productivity: Decimal,
        fieldworkers: u32,
    ) -> Decimal {
        raw_field_days(basis, total, productivity, fieldworkers).ceil()
    }

    fn row_transport(&self, _basis: &ProductivityBasis, row: &RegionRow) -> Decimal {
        round2(row.field_days * row.transport_unit)
    }
}
