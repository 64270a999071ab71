pub mod allocation;
pub mod builder;
pub mod engine;
pub mod overrides;
pub mod price_table;
pub mod registry;
pub mod rounding;
pub mod selector;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::domain::distribution::DistributionResult;
use crate::domain::inputs::{InputChanges, QuotationInputs};
use crate::domain::line_item::{BuildResult, CommissionFactors};
use crate::errors::{ApplicationError, QuotationError};

use self::{
    builder::BuilderParams,
    overrides::RowOverride,
    registry::RegionRegistry,
    selector::{engine_for, CoverageMode},
};

/// Complete replacement result of a rebuild.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    #[serde(rename = "entradas")]
    pub inputs: QuotationInputs,
    #[serde(rename = "distribucion")]
    pub distribution: DistributionResult,
    #[serde(rename = "cotizacion")]
    pub build: BuildResult,
}

/// Entry point for callers: owns the read-only registry and the markup factors.
///
/// Stateless between calls; a single runtime can serve concurrent quotations.
#[derive(Clone, Debug)]
pub struct QuotationRuntime {
    registry: RegionRegistry,
    factors: CommissionFactors,
}

impl Default for QuotationRuntime {
    fn default() -> Self {
        Self::new(RegionRegistry::builtin(), CommissionFactors::default())
    }
}

impl QuotationRuntime {
    pub fn new(registry: RegionRegistry, factors: CommissionFactors) -> Self {
        Self { registry, factors }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let registry = config.load_registry()?;
        Ok(Self::new(registry, config.commission_factors()))
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn factors(&self) -> CommissionFactors {
        self.factors
    }

    pub fn compute_distribution(
        &self,
        coverage: &str,
        inputs: &QuotationInputs,
    ) -> Result<DistributionResult, QuotationError> {
        let mode = CoverageMode::resolve(coverage, inputs.mode)?;
        let result = engine_for(mode, &self.registry).distribute(inputs)?;

        info!(
            event_name = "quotation.distribution.computed",
            coverage = %mode,
            base_total = result.base_total,
            adjusted_total = result.adjusted_total,
            rows = result.rows.len(),
            project_days = result.totals.project_days,
            "distribution computed"
        );
        Ok(result)
    }

    /// Re-applies row patches with the rules of the mode that produced `result`.
    pub fn merge_overrides(
        &self,
        result: DistributionResult,
        overrides: &[RowOverride],
    ) -> Result<DistributionResult, QuotationError> {
        let engine = engine_for(result.coverage, &self.registry);
        let merged = overrides::merge_overrides(engine.as_ref(), result, overrides)?;

        debug!(
            event_name = "quotation.overrides.merged",
            coverage = %merged.coverage,
            overrides = overrides.len(),
            interviews = merged.totals.interviews,
            "row overrides merged"
        );
        Ok(merged)
    }

    pub fn build_line_items(
        &self,
        inputs: &QuotationInputs,
        distribution: &DistributionResult,
    ) -> BuildResult {
        builder::build_line_items(&BuilderParams { inputs, distribution, factors: self.factors })
    }

    /// Runs selector → engine → (kept overrides) → builder from stored inputs plus `changes`.
    ///
    /// Without `keep_overrides` prior row patches are discarded. With it, patches for regions
    /// the new coverage mode does not contain are dropped and the rest are re-applied.
    pub fn rebuild(
        &self,
        stored: &QuotationInputs,
        changes: &InputChanges,
        prior_overrides: &[RowOverride],
        keep_overrides: bool,
    ) -> Result<Quotation, QuotationError> {
        let inputs = changes.apply_to(stored);
        let base = self.compute_distribution(&inputs.coverage, &inputs)?;

        let distribution = if keep_overrides && !prior_overrides.is_empty() {
            let kept = self.retain_applicable(&base, prior_overrides);
            if kept.is_empty() {
                base
            } else {
                self.merge_overrides(base, &kept)?
            }
        } else {
            base
        };

        let build = self.build_line_items(&inputs, &distribution);
        info!(
            event_name = "quotation.rebuild.completed",
            coverage = %distribution.coverage,
            kept_overrides = keep_overrides,
            items = build.line_items.len(),
            total_payable = %build.total_payable,
            "quotation rebuilt"
        );

        Ok(Quotation { inputs, distribution, build })
    }

    fn retain_applicable(
        &self,
        distribution: &DistributionResult,
        overrides: &[RowOverride],
    ) -> Vec<RowOverride> {
        overrides
            .iter()
            .filter(|row_override| {
                // Unknown department names are kept so the merge reports them.
                let Ok(region) = row_override.region() else {
                    return true;
                };
                let applicable = distribution.row(region).is_some();
                if !applicable {
                    warn!(
                        event_name = "quotation.rebuild.override_dropped",
                        coverage = %distribution.coverage,
                        region = %region,
                        "override targets a region outside the coverage mode; dropped"
                    );
                }
                applicable
            })
            .cloned()
            .collect()
    }
}
