use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::region::Region;
use crate::tariff::rounding::ceil_count;
use crate::tariff::selector::CoverageMode;

/// Overridable numeric fields of a [`RegionRow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowField {
    #[serde(rename = "urbano")]
    Urban,
    #[serde(rename = "rural")]
    Rural,
    #[serde(rename = "total")]
    Total,
    #[serde(rename = "horasEfectivas")]
    EffectiveHours,
    #[serde(rename = "productividad")]
    Productivity,
    #[serde(rename = "encuestadores")]
    Fieldworkers,
    #[serde(rename = "supervisores")]
    Supervisors,
    #[serde(rename = "diasCampoEncuest")]
    FieldDays,
    #[serde(rename = "viaticosUnit")]
    PerDiemUnit,
    #[serde(rename = "transporteUnit")]
    TransportUnit,
    #[serde(rename = "hotelUnit")]
    LodgingUnit,
    #[serde(rename = "totalViaticos")]
    PerDiemTotal,
    #[serde(rename = "totalTransporte")]
    TransportTotal,
    #[serde(rename = "totalHotel")]
    LodgingTotal,
    #[serde(rename = "precioBoleta")]
    TicketPrice,
    #[serde(rename = "totalPagoEncuestadores")]
    FieldworkerPay,
    #[serde(rename = "totalPagoSupervisores")]
    SupervisorPay,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRow {
    #[serde(rename = "departamento")]
    pub region: Region,
    #[serde(rename = "urbano")]
    pub urban: u32,
    pub rural: u32,
    pub total: u32,
    #[serde(rename = "horasEfectivas")]
    pub effective_hours: Decimal,
    #[serde(rename = "minutosEfectivos")]
    pub minutes_per_day: Decimal,
    #[serde(rename = "productividad")]
    pub productivity: Decimal,
    #[serde(rename = "encuestadores")]
    pub fieldworkers: u32,
    #[serde(rename = "supervisores")]
    pub supervisors: u32,
    #[serde(rename = "diasCampoEncuest")]
    pub field_days: Decimal,
    #[serde(rename = "viaticosUnit")]
    pub per_diem_unit: Decimal,
    #[serde(rename = "transporteUnit")]
    pub transport_unit: Decimal,
    #[serde(rename = "hotelUnit")]
    pub lodging_unit: Decimal,
    #[serde(rename = "totalViaticos")]
    pub per_diem_total: Decimal,
    #[serde(rename = "totalTransporte")]
    pub transport_total: Decimal,
    #[serde(rename = "totalHotel")]
    pub lodging_total: Decimal,
    #[serde(rename = "precioBoleta")]
    pub ticket_price: Decimal,
    #[serde(rename = "totalPagoEncuestadores")]
    pub fieldworker_pay: Decimal,
    #[serde(rename = "totalPagoSupervisores")]
    pub supervisor_pay: Decimal,
    /// Fields pinned by an explicit override; re-derivation never touches them.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub overridden: BTreeSet<RowField>,
}

impl RegionRow {
    /// Freshly allocated row: counts only, everything derived still zero.
    pub fn allocated(region: Region, urban: u32, rural: u32) -> Self {
        Self {
            region,
            urban,
            rural,
            total: urban + rural,
            effective_hours: Decimal::ZERO,
            minutes_per_day: Decimal::ZERO,
            productivity: Decimal::ZERO,
            fieldworkers: 0,
            supervisors: 0,
            field_days: Decimal::ZERO,
            per_diem_unit: Decimal::ZERO,
            transport_unit: Decimal::ZERO,
            lodging_unit: Decimal::ZERO,
            per_diem_total: Decimal::ZERO,
            transport_total: Decimal::ZERO,
            lodging_total: Decimal::ZERO,
            ticket_price: Decimal::ZERO,
            fieldworker_pay: Decimal::ZERO,
            supervisor_pay: Decimal::ZERO,
            overridden: BTreeSet::new(),
        }
    }

    pub fn headcount(&self) -> u32 {
        self.fieldworkers + self.supervisors
    }

    pub fn is_frozen(&self, field: RowField) -> bool {
        self.overridden.contains(&field)
    }
}

/// Per-calculation constants the row rules need when a row is re-derived after an override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityBasis {
    pub segment_minutes: Decimal,
    pub segment_size: u32,
    pub groups: u32,
    pub days_buffer: Decimal,
    pub vehicle_capacity: u32,
    pub supervisor_daily_rate: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionTotals {
    #[serde(rename = "totalEntrevistas")]
    pub interviews: u32,
    #[serde(rename = "totalDiasCampo")]
    pub field_days: Decimal,
    #[serde(rename = "diasProyecto")]
    pub project_days: u32,
    #[serde(rename = "totalViaticos")]
    pub per_diem: Decimal,
    #[serde(rename = "totalTransporte")]
    pub transport: Decimal,
    #[serde(rename = "totalHotel")]
    pub lodging: Decimal,
    #[serde(rename = "totalPagoEncuestadores")]
    pub fieldworker_pay: Decimal,
    #[serde(rename = "totalPagoSupervisores")]
    pub supervisor_pay: Decimal,
}

impl DistributionTotals {
    pub fn from_rows(rows: &[RegionRow]) -> Self {
        let field_days: Decimal = rows.iter().map(|row| row.field_days).sum();
        Self {
            interviews: rows.iter().map(|row| row.total).sum(),
            field_days,
            project_days: ceil_count(field_days),
            per_diem: rows.iter().map(|row| row.per_diem_total).sum(),
            transport: rows.iter().map(|row| row.transport_total).sum(),
            lodging: rows.iter().map(|row| row.lodging_total).sum(),
            fieldworker_pay: rows.iter().map(|row| row.fieldworker_pay).sum(),
            supervisor_pay: rows.iter().map(|row| row.supervisor_pay).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    #[serde(rename = "cobertura")]
    pub coverage: CoverageMode,
    #[serde(rename = "totalBase")]
    pub base_total: u32,
    #[serde(rename = "factorAjuste")]
    pub adjustment_factor: Decimal,
    #[serde(rename = "totalAjustado")]
    pub adjusted_total: u32,
    #[serde(rename = "esOnline")]
    pub online: bool,
    pub basis: ProductivityBasis,
    #[serde(rename = "filas")]
    pub rows: Vec<RegionRow>,
    #[serde(rename = "totales")]
    pub totals: DistributionTotals,
}

impl DistributionResult {
    pub fn row(&self, region: Region) -> Option<&RegionRow> {
        self.rows.iter().find(|row| row.region == region)
    }

    /// Rebuilds the result with global aggregates summed from `rows`.
    pub fn with_rows(self, rows: Vec<RegionRow>) -> Self {
        let totals = DistributionTotals::from_rows(&rows);
        Self { rows, totals, ..self }
    }
}
