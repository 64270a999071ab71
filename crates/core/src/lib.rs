//! Fieldwork quotation engine: coverage-specific interview distribution, row overrides and
//! commercial line items for face-to-face, telephone and online studies in El Salvador.

pub mod config;
pub mod domain;
pub mod errors;
pub mod tariff;

pub use domain::distribution::{
    DistributionResult, DistributionTotals, ProductivityBasis, RegionRow, RowField,
};
pub use domain::inputs::{
    FieldworkSourcing, InputChanges, InterviewMode, Penetration, QuotationInputs,
};
pub use domain::line_item::{BuildResult, CommissionFactors, LineCategory, LineItem, PricingRule};
pub use domain::region::Region;
pub use errors::{ApplicationError, InterfaceError, QuotationError};
pub use tariff::builder::{build_line_items, BuilderParams};
pub use tariff::engine::DistributionEngine;
pub use tariff::overrides::{merge_overrides, RowOverride, RowPatch};
pub use tariff::price_table::price_for;
pub use tariff::registry::{RegionRegistry, RegistryError};
pub use tariff::selector::{engine_for, CoverageMode};
pub use tariff::{Quotation, QuotationRuntime};
