//! Sparse row patches layered over engine-computed distribution rows.
//!
//! A patched field is pinned in the row's `overridden` set and stays pinned through later
//! merges. Every other derived field of a targeted row is re-derived with the row rules of the
//! engine that produced the distribution. Untargeted rows are left untouched.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::distribution::{DistributionResult, RegionRow, RowField};
use crate::domain::region::Region;
use crate::errors::QuotationError;
use crate::tariff::engine::DistributionEngine;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowPatch {
    #[serde(rename = "urbano", skip_serializing_if = "Option::is_none")]
    pub urban: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rural: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(rename = "horasEfectivas", skip_serializing_if = "Option::is_none")]
    pub effective_hours: Option<Decimal>,
    #[serde(rename = "productividad", skip_serializing_if = "Option::is_none")]
    pub productivity: Option<Decimal>,
    #[serde(rename = "encuestadores", skip_serializing_if = "Option::is_none")]
    pub fieldworkers: Option<u32>,
    #[serde(rename = "supervisores", skip_serializing_if = "Option::is_none")]
    pub supervisors: Option<u32>,
    #[serde(rename = "diasCampoEncuest", skip_serializing_if = "Option::is_none")]
    pub field_days: Option<Decimal>,
    #[serde(rename = "viaticosUnit", skip_serializing_if = "Option::is_none")]
    pub per_diem_unit: Option<Decimal>,
    #[serde(rename = "transporteUnit", skip_serializing_if = "Option::is_none")]
    pub transport_unit: Option<Decimal>,
    #[serde(rename = "hotelUnit", skip_serializing_if = "Option::is_none")]
    pub lodging_unit: Option<Decimal>,
    #[serde(rename = "totalViaticos", skip_serializing_if = "Option::is_none")]
    pub per_diem_total: Option<Decimal>,
    #[serde(rename = "totalTransporte", skip_serializing_if = "Option::is_none")]
    pub transport_total: Option<Decimal>,
    #[serde(rename = "totalHotel", skip_serializing_if = "Option::is_none")]
    pub lodging_total: Option<Decimal>,
    #[serde(rename = "precioBoleta", skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<Decimal>,
    #[serde(rename = "totalPagoEncuestadores", skip_serializing_if = "Option::is_none")]
    pub fieldworker_pay: Option<Decimal>,
    #[serde(rename = "totalPagoSupervisores", skip_serializing_if = "Option::is_none")]
    pub supervisor_pay: Option<Decimal>,
}

/// A patch addressed to one region, in the flat shape callers persist:
/// `{ "departamento": "La Paz", "urbano": 40 }`.
///
/// The department is kept as written and resolved at merge time, so a name outside the
/// closed region set surfaces as `NotFound` rather than as a decoding failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOverride {
    #[serde(rename = "departamento")]
    pub department: String,
    #[serde(flatten)]
    pub patch: RowPatch,
}

impl RowOverride {
    pub fn new(region: Region, patch: RowPatch) -> Self {
        Self { department: region.name().to_owned(), patch }
    }

    /// Region named by `department`; accents and case are not significant.
    pub fn region(&self) -> Result<Region, QuotationError> {
        self.department.parse()
    }
}

impl RowPatch {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields this patch sets.
    pub fn fields(&self) -> BTreeSet<RowField> {
        let counts = [
            (RowField::Urban, self.urban.is_some()),
            (RowField::Rural, self.rural.is_some()),
            (RowField::Total, self.total.is_some()),
            (RowField::Fieldworkers, self.fieldworkers.is_some()),
            (RowField::Supervisors, self.supervisors.is_some()),
        ];
        let decimals = self.decimal_fields().map(|(field, _, value)| (field, value.is_some()));

        counts
            .into_iter()
            .chain(decimals)
            .filter_map(|(field, present)| present.then_some(field))
            .collect()
    }

    fn decimal_fields(&self) -> [(RowField, &'static str, Option<Decimal>); 12] {
        [
            (RowField::EffectiveHours, "horasEfectivas", self.effective_hours),
            (RowField::Productivity, "productividad", self.productivity),
            (RowField::FieldDays, "diasCampoEncuest", self.field_days),
            (RowField::PerDiemUnit, "viaticosUnit", self.per_diem_unit),
            (RowField::TransportUnit, "transporteUnit", self.transport_unit),
            (RowField::LodgingUnit, "hotelUnit", self.lodging_unit),
            (RowField::PerDiemTotal, "totalViaticos", self.per_diem_total),
            (RowField::TransportTotal, "totalTransporte", self.transport_total),
            (RowField::LodgingTotal, "totalHotel", self.lodging_total),
            (RowField::TicketPrice, "precioBoleta", self.ticket_price),
            (RowField::FieldworkerPay, "totalPagoEncuestadores", self.fieldworker_pay),
            (RowField::SupervisorPay, "totalPagoSupervisores", self.supervisor_pay),
        ]
    }

    fn validate(&self, region: Region) -> Result<(), QuotationError> {
        if self.is_empty() {
            return Err(QuotationError::invalid(
                "override",
                region,
                "an override must set at least one field",
            ));
        }

        for (_, name, value) in self.decimal_fields() {
            if let Some(value) = value.filter(|value| *value < Decimal::ZERO) {
                return Err(QuotationError::invalid(
                    format!("{region}.{name}"),
                    value,
                    "must be >= 0",
                ));
            }
        }

        if let (Some(total), Some(urban), Some(rural)) = (self.total, self.urban, self.rural) {
            if urban.checked_add(rural) != Some(total) {
                return Err(QuotationError::InconsistentOverride {
                    region: region.to_string(),
                    total,
                    urban,
                    rural,
                });
            }
        }
        Ok(())
    }

    /// Copies the supplied values over `row` and pins them.
    fn apply(&self, row: RegionRow) -> RegionRow {
        let mut overridden = row.overridden.clone();
        overridden.extend(self.fields());

        RegionRow {
            urban: self.urban.unwrap_or(row.urban),
            rural: self.rural.unwrap_or(row.rural),
            total: self.total.unwrap_or(row.total),
            effective_hours: self.effective_hours.unwrap_or(row.effective_hours),
            productivity: self.productivity.unwrap_or(row.productivity),
            fieldworkers: self.fieldworkers.unwrap_or(row.fieldworkers),
            supervisors: self.supervisors.unwrap_or(row.supervisors),
            field_days: self.field_days.unwrap_or(row.field_days),
            per_diem_unit: self.per_diem_unit.unwrap_or(row.per_diem_unit),
            transport_unit: self.transport_unit.unwrap_or(row.transport_unit),
            lodging_unit: self.lodging_unit.unwrap_or(row.lodging_unit),
            per_diem_total: self.per_diem_total.unwrap_or(row.per_diem_total),
            transport_total: self.transport_total.unwrap_or(row.transport_total),
            lodging_total: self.lodging_total.unwrap_or(row.lodging_total),
            ticket_price: self.ticket_price.unwrap_or(row.ticket_price),
            fieldworker_pay: self.fieldworker_pay.unwrap_or(row.fieldworker_pay),
            supervisor_pay: self.supervisor_pay.unwrap_or(row.supervisor_pay),
            overridden,
            ..row
        }
    }
}

/// Applies `overrides` in order and recomputes the global aggregates.
///
/// Every override is checked before any row changes, and rows are patched on a copy, so a
/// failure leaves no partial merge.
pub fn merge_overrides(
    engine: &dyn DistributionEngine,
    result: DistributionResult,
    overrides: &[RowOverride],
) -> Result<DistributionResult, QuotationError> {
    let mut targets = Vec::with_capacity(overrides.len());
    for row_override in overrides {
        let region = row_override.region()?;
        if result.row(region).is_none() {
            return Err(QuotationError::NotFound { region: region.to_string() });
        }
        row_override.patch.validate(region)?;
        targets.push((region, &row_override.patch));
    }

    let mut rows = result.rows.clone();
    for (region, patch) in targets {
        let Some(row) = rows.iter_mut().find(|row| row.region == region) else {
            return Err(QuotationError::NotFound { region: region.to_string() });
        };
        let patched = patch.apply(row.clone());
        check_counts(&patched)?;
        *row = engine.rederive_row(&result.basis, patched);
    }

    rows.iter().try_fold(0u32, |sum, row| sum.checked_add(row.total)).ok_or_else(|| {
        QuotationError::invalid(
            "totalEntrevistas",
            "overflow",
            "patched row totals exceed the representable interview count",
        )
    })?;

    Ok(result.with_rows(rows))
}

/// Count sums the row rules derive from a patched row must stay representable.
fn check_counts(row: &RegionRow) -> Result<(), QuotationError> {
    let region = row.region;
    if !row.is_frozen(RowField::Total) && row.urban.checked_add(row.rural).is_none() {
        return Err(QuotationError::invalid(
            format!("{region}.total"),
            format!("{} + {}", row.urban, row.rural),
            "urbano + rural exceeds the representable interview count",
        ));
    }
    if row.fieldworkers.checked_add(row.supervisors).is_none() {
        return Err(QuotationError::invalid(
            format!("{region}.encuestadores"),
            format!("{} + {}", row.fieldworkers, row.supervisors),
            "encuestadores + supervisores exceeds the representable headcount",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{merge_overrides, RowOverride, RowPatch};
    use crate::domain::distribution::{DistributionResult, RowField};
    use crate::domain::region::Region;
    use crate::tariff::engine::fixtures::scenario_inputs;
    use crate::tariff::engine::amss::AmssEngine;
    use crate::tariff::engine::national::NationalEngine;
    use crate::tariff::engine::DistributionEngine;
    use crate::tariff::registry::RegionRegistry;
    use crate::tariff::rounding::round2;

    fn national(registry: &RegionRegistry) -> (NationalEngine<'_>, DistributionResult) {
        let engine = NationalEngine::new(registry);
        let result = engine.distribute(&scenario_inputs("nacional")).expect("distribute");
        (engine, result)
    }

    #[test]
    fn overriding_counts_recomputes_total_and_downstream_costs() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);
        let patch = RowPatch { urban: Some(200), rural: Some(50), ..RowPatch::default() };

        let merged =
            merge_overrides(&engine, base.clone(), &[RowOverride::new(Region::SanSalvador, patch)])
                .expect("merge");

        let row = merged.row(Region::SanSalvador).expect("row");
        assert_eq!(row.total, 250);
        assert_eq!(row.fieldworker_pay, Decimal::new(375_00, 2));
        assert!(row.field_days < base.row(Region::SanSalvador).expect("row").field_days);
        assert!(row.is_frozen(RowField::Urban));
        assert!(!row.is_frozen(RowField::Total));

        let summed: Decimal = merged.rows.iter().map(|row| row.fieldworker_pay).sum();
        assert_eq!(merged.totals.fieldworker_pay, summed);
        assert_eq!(merged.totals.interviews, 1045);
        assert_eq!(merged.row(Region::LaPaz), base.row(Region::LaPaz));
    }

    #[test]
    fn overriding_field_days_flows_into_costs_but_not_pinned_totals() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);
        let patch = RowPatch {
            field_days: Some(Decimal::from(10)),
            lodging_total: Some(Decimal::new(99_99, 2)),
            ..RowPatch::default()
        };

        let merged =
            merge_overrides(&engine, base, &[RowOverride::new(Region::Morazan, patch)])
                .expect("merge");

        let row = merged.row(Region::Morazan).expect("row");
        assert_eq!(row.field_days, Decimal::from(10));
        assert_eq!(
            row.per_diem_total,
            round2(Decimal::from(12) * Decimal::from(10) * row.per_diem_unit)
        );
        assert_eq!(row.supervisor_pay, Decimal::from(250));
        assert_eq!(row.lodging_total, Decimal::new(99_99, 2));
    }

    #[test]
    fn earlier_pins_survive_later_merges() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);
        let first = RowOverride::new(
            Region::LaUnion,
            RowPatch { field_days: Some(Decimal::from(3)), ..RowPatch::default() },
        );
        let second = RowOverride::new(
            Region::LaUnion,
            RowPatch { urban: Some(90), ..RowPatch::default() },
        );

        let once = merge_overrides(&engine, base, &[first]).expect("first merge");
        let twice = merge_overrides(&engine, once, &[second]).expect("second merge");

        let row = twice.row(Region::LaUnion).expect("row");
        assert_eq!(row.field_days, Decimal::from(3));
        assert_eq!(row.total, 90 + row.rural);
        assert!(row.is_frozen(RowField::FieldDays));
        assert!(row.is_frozen(RowField::Urban));
    }

    #[test]
    fn merging_the_same_override_twice_is_idempotent() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);
        let overrides = [RowOverride::new(
            Region::Sonsonate,
            RowPatch {
                fieldworkers: Some(3),
                transport_unit: Some(Decimal::from(12)),
                ..RowPatch::default()
            },
        )];

        let once = merge_overrides(&engine, base, &overrides).expect("once");
        let twice = merge_overrides(&engine, once.clone(), &overrides).expect("twice");
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_region_fails_whole_merge() {
        let registry = RegionRegistry::builtin();
        let engine = AmssEngine::new(&registry);
        let base = engine.distribute(&scenario_inputs("amss")).expect("distribute");
        let overrides = [RowOverride::new(
            Region::Morazan,
            RowPatch { urban: Some(5), ..RowPatch::default() },
        )];

        let error = merge_overrides(&engine, base.clone(), &overrides).expect_err("not in amss");
        assert_eq!(error.kind(), "not_found");

        let unknown: Vec<RowOverride> =
            serde_json::from_str(r#"[{ "departamento": "Atlántida", "urbano": 5 }]"#)
                .expect("any department name decodes");
        let error = merge_overrides(&engine, base, &unknown).expect_err("not a department");
        assert_eq!(error.kind(), "not_found");
        assert!(error.to_string().contains("Atlántida"));
    }

    #[test]
    fn rejects_inconsistent_empty_and_negative_patches() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);

        let inconsistent = RowOverride::new(
            Region::LaPaz,
            RowPatch { urban: Some(10), rural: Some(5), total: Some(20), ..RowPatch::default() },
        );
        let error = merge_overrides(&engine, base.clone(), &[inconsistent]).expect_err("sum");
        assert_eq!(error.kind(), "inconsistent_override");

        let empty = RowOverride::new(Region::LaPaz, RowPatch::default());
        let error = merge_overrides(&engine, base.clone(), &[empty]).expect_err("empty");
        assert_eq!(error.kind(), "invalid_input");

        let negative = RowOverride::new(
            Region::LaPaz,
            RowPatch { per_diem_unit: Some(Decimal::NEGATIVE_ONE), ..RowPatch::default() },
        );
        let error = merge_overrides(&engine, base, &[negative]).expect_err("negative");
        assert!(error.to_string().contains("viaticosUnit"));
    }

    #[test]
    fn counts_too_large_to_sum_are_rejected_instead_of_wrapping() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);

        let interviews = RowOverride::new(
            Region::LaPaz,
            RowPatch { urban: Some(u32::MAX), rural: Some(1), ..RowPatch::default() },
        );
        let error = merge_overrides(&engine, base.clone(), &[interviews]).expect_err("urban");
        assert_eq!(error.kind(), "invalid_input");
        assert!(error.to_string().contains("La Paz.total"));

        let staff = RowOverride::new(
            Region::LaPaz,
            RowPatch { fieldworkers: Some(u32::MAX), ..RowPatch::default() },
        );
        let error = merge_overrides(&engine, base.clone(), &[staff]).expect_err("headcount");
        assert!(error.to_string().contains("La Paz.encuestadores"));

        let across_rows = [
            RowOverride::new(
                Region::LaPaz,
                RowPatch { total: Some(u32::MAX), ..RowPatch::default() },
            ),
            RowOverride::new(
                Region::SanMiguel,
                RowPatch { total: Some(1), ..RowPatch::default() },
            ),
        ];
        let error = merge_overrides(&engine, base, &across_rows).expect_err("distribution");
        assert!(error.to_string().contains("totalEntrevistas"));
    }

    #[test]
    fn consistent_triple_is_accepted_and_pinned() {
        let registry = RegionRegistry::builtin();
        let (engine, base) = national(&registry);
        let overrides = [RowOverride::new(
            Region::LaPaz,
            RowPatch { urban: Some(10), rural: Some(5), total: Some(15), ..RowPatch::default() },
        )];

        let merged = merge_overrides(&engine, base, &overrides).expect("merge");
        let row = merged.row(Region::LaPaz).expect("row");
        assert_eq!(row.total, 15);
        assert!(row.is_frozen(RowField::Total));
    }

    #[test]
    fn amss_rows_rederive_with_amss_rules() {
        let registry = RegionRegistry::builtin();
        let engine = AmssEngine::new(&registry);
        let base = engine.distribute(&scenario_inputs("amss")).expect("distribute");
        let overrides = [RowOverride::new(
            Region::SanSalvador,
            RowPatch { effective_hours: Some(Decimal::from(6)), ..RowPatch::default() },
        )];

        let merged = merge_overrides(&engine, base, &overrides).expect("merge");
        let row = merged.row(Region::SanSalvador).expect("row");
        // 360 / 127.5 × 5 / 8 = 1.76… floored to 1
        assert_eq!(row.productivity, Decimal::ONE);
        // 1050 / 30 × 1.05 = 36.75 → 37
        assert_eq!(row.field_days, Decimal::from(37));
        assert_eq!(row.transport_total, Decimal::from(37 * 35));
    }

    #[test]
    fn overrides_deserialize_from_flat_rows() {
        let parsed: Vec<RowOverride> = serde_json::from_str(
            r#"[{ "departamento": "Cabañas", "urbano": 12, "viaticosUnit": "9.50" },
                { "departamento": "La Union", "diasCampoEncuest": 4 }]"#,
        )
        .expect("deserialize");

        assert_eq!(parsed[0].region(), Ok(Region::Cabanas));
        assert_eq!(parsed[0].patch.urban, Some(12));
        assert_eq!(parsed[0].patch.per_diem_unit, Some(Decimal::new(950, 2)));
        assert_eq!(parsed[1].region(), Ok(Region::LaUnion));
        assert_eq!(parsed[1].patch.field_days, Some(Decimal::from(4)));
    }
}
