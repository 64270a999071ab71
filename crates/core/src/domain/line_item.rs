use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineCategory {
    #[serde(rename = "Trabajo de campo", alias = "Fieldwork")]
    Fieldwork,
    #[serde(rename = "Recursos", alias = "Resources")]
    Resources,
    #[serde(rename = "Dirección", alias = "Direction")]
    Direction,
}

/// How an item's commercial total is reached from its base cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingRule {
    /// `base × (1 + factor)`, factor chosen by the commissionable flag.
    Commission,
    /// `base ÷ margin`; used for director time.
    Margin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub key: String,
    #[serde(rename = "categoria")]
    pub category: LineCategory,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "personas")]
    pub quantity: Option<u32>,
    #[serde(rename = "dias")]
    pub duration: Option<Decimal>,
    #[serde(rename = "costoUnitario")]
    pub unit_cost: Option<Decimal>,
    #[serde(rename = "costoBase")]
    pub base_cost: Decimal,
    #[serde(rename = "comisionable")]
    pub commissionable: bool,
    #[serde(rename = "regla")]
    pub pricing: PricingRule,
    #[serde(rename = "totalConComision")]
    pub total_with_commission: Decimal,
    #[serde(rename = "orden")]
    pub order: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionFactors {
    #[serde(rename = "factorComisionable")]
    pub commissionable: Decimal,
    #[serde(rename = "factorNoComisionable")]
    pub non_commissionable: Decimal,
}

impl Default for CommissionFactors {
    fn default() -> Self {
        Self { commissionable: Decimal::ONE, non_commissionable: Decimal::new(5, 2) }
    }
}

impl CommissionFactors {
    pub fn for_item(&self, commissionable: bool) -> Decimal {
        if commissionable {
            self.commissionable
        } else {
            self.non_commissionable
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    #[serde(rename = "items")]
    pub line_items: Vec<LineItem>,
    #[serde(rename = "totalPagar")]
    pub total_payable: Decimal,
    #[serde(rename = "costoPorEntrevista")]
    pub cost_per_interview: Decimal,
}

impl BuildResult {
    pub fn item(&self, key: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|item| item.key == key)
    }

    pub fn category_total(&self, category: LineCategory) -> Decimal {
        self.line_items
            .iter()
            .filter(|item| item.category == category)
            .map(|item| item.total_with_commission)
            .sum()
    }
}
