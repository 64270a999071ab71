use rust_decimal::Decimal;

use crate::domain::region::Region;
use crate::tariff::engine::DistributionEngine;
use crate::tariff::registry::{CoverageProfile, FieldworkModel, RegionRegistry};
use crate::tariff::selector::CoverageMode;

/// Head cities of the seven largest departments, urban cells only.
pub struct PrincipalCitiesEngine<'a> {
    registry: &'a RegionRegistry,
}

impl<'a> PrincipalCitiesEngine<'a> {
    pub fn new(registry: &'a RegionRegistry) -> Self {
        Self { registry }
    }
}

impl DistributionEngine for PrincipalCitiesEngine<'_> {
    fn mode(&self) -> CoverageMode {
        CoverageMode::PrincipalCities
    }

    fn profile(&self) -> &CoverageProfile {
        &self.registry.principal_cities
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
    use rust_decimal::Decimal;

    use super::PrincipalCitiesEngine;
    use crate::domain::region::Region;
    use crate::tariff::engine::fixtures::scenario_inputs;
    use crate::tariff::engine::DistributionEngine;
    use crate::tariff::registry::RegionRegistry;

    #[test]
    fn only_head_cities_receive_interviews() {
        let registry = RegionRegistry::builtin();
        let engine = PrincipalCitiesEngine::new(&registry);
        let inputs = scenario_inputs("ciudades_principales");
        let result = engine.distribute(&inputs).expect("distribute");

        assert_eq!(result.rows.len(), 7);
        assert!(result.row(Region::Morazan).is_none());
        assert!(result.rows.iter().all(|row| row.rural == 0));
        assert_eq!(result.totals.interviews, 1050);

        assert_eq!(result.row(Region::SanSalvador).expect("row").urban, 420);
        // 157.5 and 52.5 tie on remainder; the earlier city takes the leftover unit
        assert_eq!(result.row(Region::LaLibertad).expect("row").urban, 158);
        assert_eq!(result.row(Region::Ahuachapan).expect("row").urban, 52);
    }

    #[test]
    fn allocation_is_sum_exact() {
        let registry = RegionRegistry::builtin();
        let engine = PrincipalCitiesEngine::new(&registry);
        let mut inputs = scenario_inputs("ciudades_principales");
        for total in (1..=2_000).step_by(7) {
            inputs.total_interviews = total;
            let allocation = engine.allocate(&inputs).expect("allocate");
            assert_eq!(
                allocation.rows.iter().map(|row| row.urban).sum::<u32>(),
                engine.adjusted_total(total)
            );
        }
    }

    #[test]
    fn uses_national_style_staffing_and_price_table() {
        let registry = RegionRegistry::builtin();
        let engine = PrincipalCitiesEngine::new(&registry);
        let inputs = scenario_inputs("ciudades_principales");
        let result = engine.distribute(&inputs).expect("distribute");

        for row in &result.rows {
            assert_eq!(row.fieldworkers, 8);
            assert_eq!(row.supervisors, 4);
            assert_eq!(row.ticket_price, Decimal::new(150, 2));
        }
    }
}
