//! Commercial line items priced from a finalized distribution.
//!
//! The catalogue is fixed: a Fieldwork block (or a single subcontract line), a Resources block
//! of per-person consumables, and a Direction block of closed-form professional time. Every
//! monetary intermediate is rounded to cents where it is computed.

use rust_decimal::Decimal;

use crate::domain::distribution::DistributionResult;
use crate::domain::inputs::{FieldworkSourcing, InterviewMode, QuotationInputs};
use crate::domain::line_item::{
    BuildResult, CommissionFactors, LineCategory, LineItem, PricingRule,
};
use crate::tariff::rounding::{ceil_count, guarded_div, round2};

const DIRECTION_DAY_RATE: i64 = 25_00;
const TRAINING_RATE: i64 = 10_00;
const FILTER_QUESTION_RATE: i64 = 10;

const PHONE_RATE: i64 = 50;
const MOBILE_DATA_RATE: i64 = 1_00;
const INTERNET_RATE: i64 = 35;
const USB_RATE: i64 = 6_00;
const PAPER_RATE: i64 = 25;
const DEVICE_RATE: i64 = 1_50;
const CAPTURE_PLATFORM_RATE: i64 = 12;

const DIRECTOR_HOURLY: i64 = 10_00;
const DIRECTOR_MARGIN: i64 = 40;
const QUESTIONNAIRE_HOURLY: i64 = 10_00;
const SCRIPT_HOURLY: i64 = 8_00;
const REPORT_HOURS: i64 = 20;
const REPORT_HOURLY: i64 = 12_00;
const BI_SETUP: i64 = 120_00;
const BI_PER_WAVE: i64 = 60_00;

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Everything the builder reads: the inputs, the finalized distribution and the markup.
#[derive(Clone, Copy, Debug)]
pub struct BuilderParams<'a> {
    pub inputs: &'a QuotationInputs,
    pub distribution: &'a DistributionResult,
    pub factors: CommissionFactors,
}

pub fn build_line_items(params: &BuilderParams<'_>) -> BuildResult {
    let mut sheet = Sheet::new(params.factors);
    let staff = Staff::from_params(params);

    match &params.inputs.sourcing {
        FieldworkSourcing::InHouse => fieldwork_block(&mut sheet, params, &staff),
        FieldworkSourcing::Subcontracted { cost } => sheet.closed_form(
            "fieldwork.subcontracted",
            LineCategory::Fieldwork,
            "Trabajo de campo subcontratado",
            *cost,
            true,
        ),
    }
    resources_block(&mut sheet, params, &staff);
    direction_block(&mut sheet, params.inputs, &staff);

    sheet.finish(params.inputs.total_interviews)
}

/// Headcount and duration shared by the Fieldwork and Resources blocks.
struct Staff {
    fieldworkers: u32,
    supervisors: u32,
    days: u32,
}

impl Staff {
    fn from_params(params: &BuilderParams<'_>) -> Self {
        Self {
            fieldworkers: params.inputs.fieldworkers,
            supervisors: params.inputs.supervisors,
            days: params.distribution.totals.project_days,
        }
    }

    fn team(&self) -> u32 {
        self.fieldworkers + self.supervisors
    }

    /// Unit cost that spreads `total` over `people × days`, or zero with nobody to pay.
    fn daily_unit(&self, total: Decimal, people: u32) -> Decimal {
        round2(guarded_div(total, Decimal::from(people) * Decimal::from(self.days)))
    }
}

fn fieldwork_block(sheet: &mut Sheet, params: &BuilderParams<'_>, staff: &Staff) {
    let totals = &params.distribution.totals;
    let inputs = params.inputs;
    let days = Decimal::from(staff.days);
    let category = LineCategory::Fieldwork;

    sheet.priced(
        "fieldwork.direction",
        category,
        "Dirección de campo",
        1,
        days,
        cents(DIRECTION_DAY_RATE),
        true,
    );
    sheet.priced(
        "fieldwork.training",
        category,
        "Capacitación del equipo",
        staff.team(),
        Decimal::ONE,
        cents(TRAINING_RATE),
        true,
    );
    sheet.priced(
        "fieldwork.supervisors",
        category,
        "Supervisores",
        staff.supervisors,
        days,
        staff.daily_unit(totals.supervisor_pay, staff.supervisors),
        true,
    );
    sheet.priced(
        "fieldwork.fieldworkers",
        category,
        "Encuestadores",
        staff.fieldworkers,
        days,
        staff.daily_unit(totals.fieldworker_pay, staff.fieldworkers),
        true,
    );

    let contacts =
        ceil_count(Decimal::from(inputs.total_interviews) / inputs.penetration.fraction());
    sheet.priced(
        "fieldwork.filter_question",
        category,
        "Pago por pregunta filtro",
        contacts.saturating_sub(inputs.total_interviews),
        Decimal::ONE,
        cents(FILTER_QUESTION_RATE),
        true,
    );
    sheet.priced(
        "fieldwork.per_diem",
        category,
        "Viáticos",
        staff.team(),
        days,
        staff.daily_unit(totals.per_diem, staff.team()),
        true,
    );
    sheet.closed_form("fieldwork.transport", category, "Transporte", totals.transport, true);
    sheet.closed_form("fieldwork.lodging", category, "Hospedaje", totals.lodging, false);
}

fn resources_block(sheet: &mut Sheet, params: &BuilderParams<'_>, staff: &Staff) {
    let days = Decimal::from(staff.days);
    let category = LineCategory::Resources;
    let per_person_day = [
        ("resources.phone", "Telefonía", PHONE_RATE),
        ("resources.mobile_data", "Datos móviles", MOBILE_DATA_RATE),
        ("resources.internet", "Internet", INTERNET_RATE),
    ];
    for (key, description, rate) in per_person_day {
        sheet.priced(key, category, description, staff.team(), days, cents(rate), true);
    }

    sheet.priced(
        "resources.usb",
        category,
        "Memorias USB",
        staff.supervisors,
        Decimal::ONE,
        cents(USB_RATE),
        true,
    );
    let consumables = [
        ("resources.paper", "Papelería", PAPER_RATE),
        ("resources.device", "Uso de dispositivos", DEVICE_RATE),
    ];
    for (key, description, rate) in consumables {
        sheet.priced(key, category, description, staff.team(), days, cents(rate), true);
    }

    let platform_rate = if params.inputs.mode == InterviewMode::Telephone {
        Decimal::ZERO
    } else {
        cents(CAPTURE_PLATFORM_RATE)
    };
    sheet.priced(
        "resources.capture_platform",
        category,
        "Plataforma de captura",
        params.distribution.adjusted_total,
        Decimal::ONE,
        platform_rate,
        true,
    );
}

fn direction_block(sheet: &mut Sheet, inputs: &QuotationInputs, staff: &Staff) {
    let category = LineCategory::Direction;
    let duration = Decimal::from(inputs.duration_minutes);

    let director_hours = Decimal::from(staff.days) * Decimal::from(2) + Decimal::from(4);
    let internal = round2(director_hours * cents(DIRECTOR_HOURLY));
    sheet.push(LineItem {
        key: "direction.director".to_owned(),
        category,
        description: "Dirección del proyecto".to_owned(),
        quantity: None,
        duration: Some(director_hours),
        unit_cost: None,
        base_cost: internal,
        commissionable: false,
        pricing: PricingRule::Margin,
        total_with_commission: round2(guarded_div(internal, cents(DIRECTOR_MARGIN))),
        order: 0,
    });

    let questionnaire_hours = Decimal::from(4 + ceil_count(duration / Decimal::from(5)));
    sheet.priced(
        "direction.questionnaire",
        category,
        "Elaboración de cuestionario",
        u32::from(inputs.author_questionnaire),
        questionnaire_hours,
        cents(QUESTIONNAIRE_HOURLY),
        true,
    );

    let setup = 2;
    let programming = 3 * ceil_count(duration / Decimal::from(10));
    let testing = 2 + ceil_count(duration / Decimal::from(15));
    let deployment = 1;
    sheet.priced(
        "direction.script",
        category,
        "Programación de script",
        u32::from(inputs.author_script),
        Decimal::from(setup + programming + testing + deployment),
        cents(SCRIPT_HOURLY),
        true,
    );

    sheet.priced(
        "direction.report",
        category,
        "Informe de resultados",
        u32::from(inputs.wants_report),
        Decimal::from(REPORT_HOURS),
        cents(REPORT_HOURLY),
        true,
    );

    let bi_enabled = inputs.wants_bi_report && inputs.bi_waves > 0;
    let bi_cost = if bi_enabled {
        cents(BI_SETUP) + cents(BI_PER_WAVE) * Decimal::from(inputs.bi_waves)
    } else {
        Decimal::ZERO
    };
    sheet.push(LineItem {
        key: "direction.bi_report".to_owned(),
        category,
        description: "Informe BI".to_owned(),
        quantity: Some(if bi_enabled { inputs.bi_waves } else { 0 }),
        duration: None,
        unit_cost: None,
        base_cost: bi_cost,
        commissionable: true,
        pricing: PricingRule::Commission,
        total_with_commission: Decimal::ZERO,
        order: 0,
    });
}

/// Ordered accumulator; assigns display order and applies the markup as items land.
struct Sheet {
    factors: CommissionFactors,
    items: Vec<LineItem>,
}

impl Sheet {
    fn new(factors: CommissionFactors) -> Self {
        Self { factors, items: Vec::new() }
    }

    /// `quantity × duration × unit` item.
    #[allow(clippy::too_many_arguments)]
    fn priced(
        &mut self,
        key: &str,
        category: LineCategory,
        description: &str,
        quantity: u32,
        duration: Decimal,
        unit_cost: Decimal,
        commissionable: bool,
    ) {
        self.push(LineItem {
            key: key.to_owned(),
            category,
            description: description.to_owned(),
            quantity: Some(quantity),
            duration: Some(duration),
            unit_cost: Some(unit_cost),
            base_cost: round2(Decimal::from(quantity) * duration * unit_cost),
            commissionable,
            pricing: PricingRule::Commission,
            total_with_commission: Decimal::ZERO,
            order: 0,
        });
    }

    /// Item whose base cost is supplied directly.
    fn closed_form(
        &mut self,
        key: &str,
        category: LineCategory,
        description: &str,
        base_cost: Decimal,
        commissionable: bool,
    ) {
        self.push(LineItem {
            key: key.to_owned(),
            category,
            description: description.to_owned(),
            quantity: None,
            duration: None,
            unit_cost: None,
            base_cost: round2(base_cost),
            commissionable,
            pricing: PricingRule::Commission,
            total_with_commission: Decimal::ZERO,
            order: 0,
        });
    }

    fn push(&mut self, item: LineItem) {
        let order = u32::try_from(self.items.len() + 1).unwrap_or(u32::MAX);
        let total_with_commission = match item.pricing {
            PricingRule::Commission => {
                let factor = self.factors.for_item(item.commissionable);
                round2(item.base_cost * (Decimal::ONE + factor))
            }
            PricingRule::Margin => item.total_with_commission,
        };
        self.items.push(LineItem { order, total_with_commission, ..item });
    }

    fn finish(self, total_interviews: u32) -> BuildResult {
        let total_payable = round2(self.items.iter().map(|item| item.total_with_commission).sum());
        let cost_per_interview =
            round2(guarded_div(total_payable, Decimal::from(total_interviews)));
        BuildResult { line_items: self.items, total_payable, cost_per_interview }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{build_line_items, BuilderParams};
    use crate::domain::distribution::DistributionResult;
    use crate::domain::inputs::{FieldworkSourcing, InterviewMode, QuotationInputs};
    use crate::domain::line_item::{BuildResult, CommissionFactors, LineCategory, PricingRule};
    use crate::tariff::engine::fixtures::scenario_inputs;
    use crate::tariff::engine::national::NationalEngine;
    use crate::tariff::engine::DistributionEngine;
    use crate::tariff::registry::RegionRegistry;
    use crate::tariff::rounding::round2;

    fn distribution(inputs: &QuotationInputs) -> DistributionResult {
        let registry = RegionRegistry::builtin();
        NationalEngine::new(&registry).distribute(inputs).expect("distribute")
    }

    fn build(inputs: &QuotationInputs) -> (DistributionResult, BuildResult) {
        let distribution = distribution(inputs);
        let result = build_line_items(&BuilderParams {
            inputs,
            distribution: &distribution,
            factors: CommissionFactors::default(),
        });
        (distribution, result)
    }

    #[test]
    fn commission_doubles_commissionable_and_adds_five_percent_otherwise() {
        let mut inputs = scenario_inputs("nacional");
        inputs.sourcing = FieldworkSourcing::Subcontracted { cost: Decimal::from(100) };
        let (_, result) = build(&inputs);

        let subcontract = result.item("fieldwork.subcontracted").expect("subcontract line");
        assert_eq!(subcontract.base_cost, Decimal::from(100));
        assert_eq!(subcontract.total_with_commission, Decimal::new(200_00, 2));

        let lodging_factor = CommissionFactors::default().for_item(false);
        assert_eq!(
            round2(Decimal::from(100) * (Decimal::ONE + lodging_factor)),
            Decimal::new(105_00, 2)
        );
    }

    #[test]
    fn lodging_is_the_only_non_commissionable_fieldwork_item() {
        let (distribution, result) = build(&scenario_inputs("nacional"));

        let lodging = result.item("fieldwork.lodging").expect("lodging");
        assert!(!lodging.commissionable);
        assert_eq!(lodging.quantity, None);
        assert_eq!(lodging.base_cost, distribution.totals.lodging);
        assert_eq!(
            lodging.total_with_commission,
            round2(distribution.totals.lodging * Decimal::new(105, 2))
        );

        let transport = result.item("fieldwork.transport").expect("transport");
        assert!(transport.commissionable);
        assert_eq!(transport.unit_cost, None);
        assert_eq!(
            transport.total_with_commission,
            round2(transport.base_cost * Decimal::from(2))
        );
    }

    #[test]
    fn fieldwork_block_follows_distribution_totals() {
        let inputs = scenario_inputs("nacional");
        let (distribution, result) = build(&inputs);
        let days = Decimal::from(distribution.totals.project_days);

        let direction = result.item("fieldwork.direction").expect("direction");
        assert_eq!(direction.base_cost, round2(days * Decimal::from(25)));

        let supervisors = result.item("fieldwork.supervisors").expect("supervisors");
        assert_eq!(supervisors.quantity, Some(8));
        assert_eq!(
            supervisors.unit_cost,
            Some(round2(distribution.totals.supervisor_pay / (Decimal::from(8) * days)))
        );

        // ceil(1000 / 0.8) - 1000 screened-out contacts
        let filter = result.item("fieldwork.filter_question").expect("filter");
        assert_eq!(filter.quantity, Some(250));
        assert_eq!(filter.base_cost, Decimal::new(25_00, 2));

        let training = result.item("fieldwork.training").expect("training");
        assert_eq!(training.base_cost, Decimal::from(380));
    }

    #[test]
    fn director_days_use_project_days_and_margin() {
        let (distribution, result) = build(&scenario_inputs("nacional"));
        let director = result.item("direction.director").expect("director");

        let hours = Decimal::from(distribution.totals.project_days * 2 + 4);
        assert_eq!(director.duration, Some(hours));
        assert_eq!((director.quantity, director.unit_cost), (None, None));
        assert_eq!(director.pricing, PricingRule::Margin);
        assert_eq!(director.base_cost, round2(hours * Decimal::from(10)));
        assert_eq!(
            director.total_with_commission,
            round2(director.base_cost / Decimal::new(40, 2))
        );
    }

    #[test]
    fn authoring_items_are_gated_by_flags() {
        let mut inputs = scenario_inputs("nacional");
        let (_, result) = build(&inputs);

        // 15 minutes: 4 + 3 hours of questionnaire, 2 + 6 + 3 + 1 hours of script
        let questionnaire = result.item("direction.questionnaire").expect("questionnaire");
        assert_eq!(questionnaire.base_cost, Decimal::from(70));
        let script = result.item("direction.script").expect("script");
        assert_eq!(script.base_cost, Decimal::from(96));
        let report = result.item("direction.report").expect("report");
        assert_eq!(report.total_with_commission, Decimal::ZERO);

        inputs.author_questionnaire = false;
        inputs.author_script = false;
        inputs.wants_report = true;
        inputs.wants_bi_report = true;
        inputs.bi_waves = 2;
        let (_, result) = build(&inputs);

        let questionnaire = result.item("direction.questionnaire").expect("questionnaire");
        assert_eq!(questionnaire.quantity, Some(0));
        assert_eq!(questionnaire.total_with_commission, Decimal::ZERO);
        assert_eq!(result.item("direction.script").expect("script").base_cost, Decimal::ZERO);
        assert_eq!(result.item("direction.report").expect("report").base_cost, Decimal::from(240));
        assert_eq!(result.item("direction.bi_report").expect("bi").base_cost, Decimal::from(240));
    }

    #[test]
    fn telephone_studies_pay_nothing_for_the_capture_platform() {
        let mut inputs = scenario_inputs("nacional");
        let (_, face_to_face) = build(&inputs);
        let platform = face_to_face.item("resources.capture_platform").expect("platform");
        assert_eq!(platform.base_cost, Decimal::new(126_00, 2));

        inputs.mode = InterviewMode::Telephone;
        let (_, telephone) = build(&inputs);
        let platform = telephone.item("resources.capture_platform").expect("platform");
        assert_eq!(platform.unit_cost, Some(Decimal::ZERO));
        assert_eq!(platform.total_with_commission, Decimal::ZERO);
    }

    #[test]
    fn subcontracting_replaces_the_fieldwork_block() {
        let mut inputs = scenario_inputs("nacional");
        inputs.sourcing = FieldworkSourcing::Subcontracted { cost: Decimal::new(4_500_00, 2) };
        let (_, result) = build(&inputs);

        let fieldwork: Vec<_> = result
            .line_items
            .iter()
            .filter(|item| item.category == LineCategory::Fieldwork)
            .collect();
        assert_eq!(fieldwork.len(), 1);
        assert_eq!(fieldwork[0].key, "fieldwork.subcontracted");
        assert!(result.item("resources.phone").is_some());
    }

    #[test]
    fn totals_order_and_cost_per_interview() {
        let (_, result) = build(&scenario_inputs("nacional"));

        let orders: Vec<u32> = result.line_items.iter().map(|item| item.order).collect();
        assert_eq!(orders, (1..=result.line_items.len() as u32).collect::<Vec<_>>());
        assert_eq!(result.line_items[0].key, "fieldwork.direction");
        assert_eq!(result.line_items.last().expect("items").key, "direction.bi_report");

        let summed: Decimal = result.line_items.iter().map(|item| item.total_with_commission).sum();
        assert_eq!(result.total_payable, round2(summed));
        assert_eq!(result.cost_per_interview, round2(result.total_payable / Decimal::from(1000)));
        assert_eq!(
            result.category_total(LineCategory::Fieldwork)
                + result.category_total(LineCategory::Resources)
                + result.category_total(LineCategory::Direction),
            summed
        );
    }
}
