//! Distribution engines, one per coverage mode.
//!
//! Every variant runs the same pipeline: allocate → productivity → staffing → field-days →
//! unit costs → cost totals → price & pay. Each step takes the rows by value and returns a
//! new set, so intermediate states can be inspected and tested on their own. The provided
//! methods implement the national-style rules; variants override the steps that differ.

pub mod amss;
pub mod fully_urban;
pub mod national;
pub mod principal_cities;

use rust_decimal::Decimal;

use crate::domain::distribution::{DistributionResult, ProductivityBasis, RegionRow, RowField};
use crate::domain::inputs::QuotationInputs;
use crate::domain::region::Region;
use crate::errors::QuotationError;
use crate::tariff::allocation::largest_remainder;
use crate::tariff::price_table::price_for;
use crate::tariff::registry::{CoverageProfile, FieldworkModel};
use crate::tariff::rounding::{ceil_count, guarded_div, round2, round_count};
use crate::tariff::selector::CoverageMode;

const MINUTES_PER_HOUR: i64 = 60;

/// Output of the allocation step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub adjusted_total: u32,
    pub rows: Vec<RegionRow>,
}

pub trait DistributionEngine: Send + Sync {
    fn mode(&self) -> CoverageMode;
    fn profile(&self) -> &CoverageProfile;
    fn model(&self) -> &FieldworkModel;

    /// `(region, urban weight, rural weight)` cells fed to the allocator, in registry order.
    fn allocation_weights(&self) -> Vec<(Region, Decimal, Decimal)> {
        self.profile()
            .regions
            .iter()
            .map(|region| (region.region, region.urban_weight, region.rural_weight))
            .collect()
    }

    /// Step A: buffered total split across the region set, sum-exact before online scaling.
    fn allocate(&self, inputs: &QuotationInputs) -> Result<Allocation, QuotationError> {
        let adjusted_total = self.adjusted_total(inputs.total_interviews);
        let cells = self.allocation_weights();
        let weights: Vec<Decimal> =
            cells.iter().flat_map(|(_, urban, rural)| [*urban, *rural]).collect();
        let allocated = largest_remainder(adjusted_total, &weights)?;

        let rows = cells
            .iter()
            .zip(allocated.chunks(2))
            .map(|((region, _, _), counts)| {
                let (urban, rural) = (counts[0], counts[1]);
                if inputs.mode.is_online() {
                    let (urban, rural) = (self.online_count(urban), self.online_count(rural));
                    RegionRow::allocated(*region, urban, rural)
                } else {
                    RegionRow::allocated(*region, urban, rural)
                }
            })
            .collect();

        Ok(Allocation { adjusted_total, rows })
    }

    fn adjusted_total(&self, base_total: u32) -> u32 {
        round_count(Decimal::from(base_total) * self.model().sample_buffer)
    }

    fn online_count(&self, count: u32) -> u32 {
        round_count(Decimal::from(count) * self.model().online_factor)
    }

    /// Step B constants: team grouping and the minutes one segment of interviews costs.
    fn productivity_basis(
        &self,
        inputs: &QuotationInputs,
    ) -> Result<ProductivityBasis, QuotationError> {
        let model = self.model();
        let penetration = inputs.penetration.fraction();
        if inputs.duration_minutes == 0 {
            return Err(QuotationError::invalid(
                "duracionMinutos",
                inputs.duration_minutes,
                "must be greater than zero",
            ));
        }

        let groups = round_count(
            Decimal::from(inputs.fieldworkers) / Decimal::from(model.group_size),
        )
        .max(1);
        let per_interview =
            Decimal::from(inputs.duration_minutes) + model.filter_minutes / penetration;
        let segment_minutes = Decimal::from(model.segment_size) * per_interview
            + model.search_minutes
            + model.travel_minutes;

        Ok(ProductivityBasis {
            segment_minutes,
            segment_size: model.segment_size,
            groups,
            days_buffer: model.days_buffer,
            vehicle_capacity: model.vehicle_capacity,
            supervisor_daily_rate: self.profile().supervisor_daily_rate,
        })
    }

    /// Interviews per fieldworker per day for a region with `minutes_per_day` of fieldwork.
    fn row_productivity(&self, basis: &ProductivityBasis, minutes_per_day: Decimal) -> Decimal {
        let segments_per_day = guarded_div(minutes_per_day, basis.segment_minutes);
        segments_per_day * Decimal::from(basis.segment_size) / Decimal::from(basis.groups.max(1))
    }

    /// Step B: effective hours from the registry, then productivity.
    fn productivity(&self, basis: &ProductivityBasis, rows: Vec<RegionRow>) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| {
                let effective_hours = self
                    .profile()
                    .region(row.region)
                    .map(|profile| profile.effective_hours)
                    .unwrap_or_default();
                let minutes_per_day = effective_hours * Decimal::from(MINUTES_PER_HOUR);
                RegionRow {
                    effective_hours,
                    minutes_per_day,
                    productivity: self.row_productivity(basis, minutes_per_day),
                    ..row
                }
            })
            .collect()
    }

    /// Step C: every region is worked by the same team shape.
    fn staffing(
        &self,
        _inputs: &QuotationInputs,
        basis: &ProductivityBasis,
        rows: Vec<RegionRow>,
    ) -> Vec<RegionRow> {
        let fieldworkers = basis.groups;
        let supervisors =
            ceil_count(Decimal::from(fieldworkers) / Decimal::from(self.model().supervisor_split))
                .max(1);
        rows.into_iter().map(|row| RegionRow { fieldworkers, supervisors, ..row }).collect()
    }

    /// Field-days for one region, kept unrounded; only the global sum is rounded up.
    fn row_field_days(
        &self,
        basis: &ProductivityBasis,
        total: u32,
        productivity: Decimal,
        fieldworkers: u32,
    ) -> Decimal {
        raw_field_days(basis, total, productivity, fieldworkers)
    }

    /// Step D.
    fn field_days(&self, basis: &ProductivityBasis, rows: Vec<RegionRow>) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| RegionRow {
                field_days: self.row_field_days(
                    basis,
                    row.total,
                    row.productivity,
                    row.fieldworkers,
                ),
                ..row
            })
            .collect()
    }

    /// Step E: fixed per-diem, transport and lodging unit costs.
    fn unit_costs(&self, rows: Vec<RegionRow>) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| match self.profile().region(row.region) {
                Some(profile) => RegionRow {
                    per_diem_unit: profile.per_diem_unit,
                    transport_unit: profile.transport_unit,
                    lodging_unit: profile.lodging_unit,
                    ..row
                },
                None => row,
            })
            .collect()
    }

    /// Vehicles needed per group, one group per supervisor, for the row's field-days.
    fn row_transport(&self, basis: &ProductivityBasis, row: &RegionRow) -> Decimal {
        let groups = row.supervisors.max(1);
        let leaders = u32::from(row.supervisors > 0);
        let people_per_group =
            ceil_count(Decimal::from(row.fieldworkers) / Decimal::from(groups)) + leaders;
        let vehicles_per_group = ceil_count(
            Decimal::from(people_per_group) / Decimal::from(basis.vehicle_capacity.max(1)),
        );
        round2(
            Decimal::from(groups)
                * Decimal::from(vehicles_per_group)
                * row.transport_unit
                * row.field_days,
        )
    }

    fn row_per_diem(&self, row: &RegionRow) -> Decimal {
        round2(Decimal::from(row.headcount()) * row.field_days * row.per_diem_unit)
    }

    fn row_lodging(&self, row: &RegionRow) -> Decimal {
        round2(Decimal::from(row.headcount()) * row.field_days * row.lodging_unit)
    }

    /// Step F.
    fn cost_totals(&self, basis: &ProductivityBasis, rows: Vec<RegionRow>) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| RegionRow {
                per_diem_total: self.row_per_diem(&row),
                transport_total: self.row_transport(basis, &row),
                lodging_total: self.row_lodging(&row),
                ..row
            })
            .collect()
    }

    fn ticket_price(&self, inputs: &QuotationInputs) -> Result<Decimal, QuotationError> {
        match self.profile().fixed_ticket_price {
            Some(price) => Ok(price),
            None => price_for(inputs.duration_minutes, inputs.penetration.fraction()),
        }
    }

    fn row_supervisor_pay(&self, basis: &ProductivityBasis, field_days: Decimal) -> Decimal {
        round2(basis.supervisor_daily_rate * field_days)
    }

    /// Step G.
    fn price_and_pay(
        &self,
        ticket_price: Decimal,
        basis: &ProductivityBasis,
        rows: Vec<RegionRow>,
    ) -> Vec<RegionRow> {
        rows.into_iter()
            .map(|row| RegionRow {
                ticket_price,
                fieldworker_pay: round2(ticket_price * Decimal::from(row.total)),
                supervisor_pay: self.row_supervisor_pay(basis, row.field_days),
                ..row
            })
            .collect()
    }

    /// Runs the whole pipeline. Fails before any row is produced on invalid input.
    fn distribute(&self, inputs: &QuotationInputs) -> Result<DistributionResult, QuotationError> {
        inputs.validate()?;
        let ticket_price = self.ticket_price(inputs)?;
        let basis = self.productivity_basis(inputs)?;
        let Allocation { adjusted_total, rows } = self.allocate(inputs)?;

        let rows = self.productivity(&basis, rows);
        let rows = self.staffing(inputs, &basis, rows);
        let rows = self.field_days(&basis, rows);
        let rows = self.unit_costs(rows);
        let rows = self.cost_totals(&basis, rows);
        let rows = self.price_and_pay(ticket_price, &basis, rows);

        let result = DistributionResult {
            coverage: self.mode(),
            base_total: inputs.total_interviews,
            adjustment_factor: self.model().sample_buffer,
            adjusted_total,
            online: inputs.mode.is_online(),
            basis,
            rows: Vec::new(),
            totals: Default::default(),
        };
        Ok(result.with_rows(rows))
    }

    /// Recomputes every derived field of `row` that is not pinned by an override,
    /// in dependency order.
    fn rederive_row(&self, basis: &ProductivityBasis, row: RegionRow) -> RegionRow {
        let mut next = row;
        if !next.is_frozen(RowField::Total) {
            next.total = next.urban + next.rural;
        }
        next.minutes_per_day = next.effective_hours * Decimal::from(MINUTES_PER_HOUR);
        if !next.is_frozen(RowField::Productivity) {
            next.productivity = self.row_productivity(basis, next.minutes_per_day);
        }
        if !next.is_frozen(RowField::FieldDays) {
            next.field_days =
                self.row_field_days(basis, next.total, next.productivity, next.fieldworkers);
        }
        if !next.is_frozen(RowField::PerDiemTotal) {
            next.per_diem_total = self.row_per_diem(&next);
        }
        if !next.is_frozen(RowField::TransportTotal) {
            next.transport_total = self.row_transport(basis, &next);
        }
        if !next.is_frozen(RowField::LodgingTotal) {
            next.lodging_total = self.row_lodging(&next);
        }
        if !next.is_frozen(RowField::FieldworkerPay) {
            next.fieldworker_pay = round2(next.ticket_price * Decimal::from(next.total));
        }
        if !next.is_frozen(RowField::SupervisorPay) {
            next.supervisor_pay = self.row_supervisor_pay(basis, next.field_days);
        }
        next
    }
}

/// Unrounded `total / (productivity × fieldworkers) × buffer`; zero capacity yields zero days.
pub fn raw_field_days(
    basis: &ProductivityBasis,
    total: u32,
    productivity: Decimal,
    fieldworkers: u32,
) -> Decimal {
    let capacity = productivity * Decimal::from(fieldworkers);
    guarded_div(Decimal::from(total), capacity) * basis.days_buffer
}
