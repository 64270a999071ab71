use rust_decimal::Decimal;

use crate::domain::region::Region;
use crate::tariff::engine::DistributionEngine;
use crate::tariff::registry::{CoverageProfile, FieldworkModel, RegionRegistry};
use crate::tariff::selector::CoverageMode;

/// Every department, but only its urban cell.
pub struct FullyUrbanEngine<'a> {
    registry: &'a RegionRegistry,
}

impl<'a> FullyUrbanEngine<'a> {
    pub fn new(registry: &'a RegionRegistry) -> Self {
        Self { registry }
    }
}

impl DistributionEngine for FullyUrbanEngine<'_> {
    fn mode(&self) -> CoverageMode {
        CoverageMode::FullyUrban
    }

    fn profile(&self) -> &CoverageProfile {
        &self.registry.fully_urban
    }

    fn model(&self) -> &FieldworkModel {
        &self.registry.model
    }

    fn allocation_weights(&self) -> Vec<(Region, Decimal, Decimal)> {
        self.profile()
            .regions
            .iter()
            .map(|region| (region.region, region.urban_weight, Decimal::ZERO))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FullyUrbanEngine;
    use crate::domain::inputs::InterviewMode;
    use crate::domain::region::Region;
    use crate::tariff::engine::fixtures::scenario_inputs;
    use crate::tariff::engine::DistributionEngine;
    use crate::tariff::registry::RegionRegistry;

    #[test]
    fn all_departments_without_rural_cells() {
        let registry = RegionRegistry::builtin();
        let engine = FullyUrbanEngine::new(&registry);
        let result = engine.distribute(&scenario_inputs("urbano")).expect("distribute");

        assert_eq!(result.rows.len(), Region::ALL.len());
        assert!(result.rows.iter().all(|row| row.rural == 0 && row.total == row.urban));
        assert_eq!(result.totals.interviews, 1050);
        let san_salvador = result.row(Region::SanSalvador).expect("row").urban;
        assert!(san_salvador > 245, "urban-only weights concentrate on the capital");
    }

    #[test]
    fn allocation_is_sum_exact() {
        let registry = RegionRegistry::builtin();
        let engine = FullyUrbanEngine::new(&registry);
        let mut inputs = scenario_inputs("urbano");
        for total in 1..=1_200 {
            inputs.total_interviews = total;
            let allocation = engine.allocate(&inputs).expect("allocate");
            assert_eq!(
                allocation.rows.iter().map(|row| row.total).sum::<u32>(),
                engine.adjusted_total(total)
            );
        }
    }

    #[test]
    fn online_scaling_applies_after_allocation() {
        let registry = RegionRegistry::builtin();
        let engine = FullyUrbanEngine::new(&registry);
        let mut inputs = scenario_inputs("urbano");
        inputs.mode = InterviewMode::Online;

        let result = engine.distribute(&inputs).expect("distribute");
        assert!(result.online);
        assert_eq!(result.adjusted_total, 1050);
        assert!(result.totals.interviews < 1050 / 5);
    }
}
