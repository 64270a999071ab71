use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::QuotationError;
use crate::tariff::price_table::MIN_DURATION_MINUTES;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewMode {
    #[default]
    #[serde(rename = "casa_por_casa", alias = "face_to_face", alias = "presencial")]
    FaceToFace,
    #[serde(rename = "telefonica", alias = "telephone")]
    Telephone,
    #[serde(rename = "online")]
    Online,
}

impl InterviewMode {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl FromStr for InterviewMode {
    type Err = QuotationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "casa_por_casa" | "casa por casa" | "face_to_face" | "presencial" => {
                Ok(Self::FaceToFace)
            }
            "telefonica" | "telefónica" | "telephone" => Ok(Self::Telephone),
            "online" => Ok(Self::Online),
            other => Err(QuotationError::invalid(
                "modalidad",
                other,
                "expected casa_por_casa|telefonica|online",
            )),
        }
    }
}

/// Share of the population that qualifies for the study, always within (0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PenetrationRepr", into = "Decimal")]
pub struct Penetration(Decimal);

#[derive(Deserialize)]
#[serde(untagged)]
enum PenetrationRepr {
    Text(String),
    Value(Decimal),
}

impl Penetration {
    pub fn new(fraction: Decimal) -> Result<Self, QuotationError> {
        if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
            return Err(QuotationError::invalid("penetracion", fraction, "must be within (0, 1]"));
        }
        Ok(Self(fraction))
    }

    pub fn fraction(self) -> Decimal {
        self.0
    }

    /// Above one half the category is considered easy to find.
    pub fn is_high(self) -> bool {
        self.0 > Decimal::new(5, 1)
    }
}

impl From<Penetration> for Decimal {
    fn from(value: Penetration) -> Self {
        value.0
    }
}

impl TryFrom<PenetrationRepr> for Penetration {
    type Error = QuotationError;

    fn try_from(value: PenetrationRepr) -> Result<Self, Self::Error> {
        match value {
            PenetrationRepr::Text(text) => text.parse(),
            PenetrationRepr::Value(number) => from_number(number),
        }
    }
}

impl FromStr for Penetration {
    type Err = QuotationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "alta" => return Self::new(Decimal::new(75, 2)),
            "media" => return Self::new(Decimal::new(50, 2)),
            "baja" => return Self::new(Decimal::new(25, 2)),
            _ => {}
        }

        if let Some(percent) = normalized.strip_suffix('%') {
            let number = parse_decimal(percent.trim(), value)?;
            return Self::new(number / Decimal::ONE_HUNDRED);
        }

        from_number(parse_decimal(&normalized, value)?)
    }
}

fn from_number(number: Decimal) -> Result<Penetration, QuotationError> {
    if number > Decimal::ONE {
        return Penetration::new(number / Decimal::ONE_HUNDRED);
    }
    Penetration::new(number)
}

fn parse_decimal(text: &str, original: &str) -> Result<Decimal, QuotationError> {
    Decimal::from_str(text).map_err(|_| {
        QuotationError::invalid(
            "penetracion",
            original.trim(),
            "expected a fraction, a percentage, or alta|media|baja",
        )
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum FieldworkSourcing {
    #[default]
    #[serde(rename = "propio", alias = "in_house")]
    InHouse,
    #[serde(rename = "subcontratado", alias = "subcontracted")]
    Subcontracted {
        #[serde(rename = "costo")]
        cost: Decimal,
    },
}

fn default_coverage() -> String {
    "nacional".to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationInputs {
    #[serde(rename = "totalEntrevistas")]
    pub total_interviews: u32,
    #[serde(rename = "duracionMinutos")]
    pub duration_minutes: u32,
    #[serde(rename = "modalidad", default)]
    pub mode: InterviewMode,
    #[serde(rename = "penetracion")]
    pub penetration: Penetration,
    #[serde(rename = "cobertura", default = "default_coverage")]
    pub coverage: String,
    #[serde(rename = "supervisores")]
    pub supervisors: u32,
    #[serde(rename = "encuestadoresTotales")]
    pub fieldworkers: u32,
    #[serde(rename = "elaboramosCuestionario", default)]
    pub author_questionnaire: bool,
    #[serde(rename = "elaboramosScript", default)]
    pub author_script: bool,
    #[serde(rename = "requiereInforme", default)]
    pub wants_report: bool,
    #[serde(rename = "requiereInformeBi", default)]
    pub wants_bi_report: bool,
    #[serde(rename = "olasBi", default)]
    pub bi_waves: u32,
    #[serde(rename = "fuenteCampo", default)]
    pub sourcing: FieldworkSourcing,
}

impl QuotationInputs {
    pub fn validate(&self) -> Result<(), QuotationError> {
        if self.total_interviews == 0 {
            return Err(QuotationError::invalid(
                "totalEntrevistas",
                self.total_interviews,
                "must be greater than zero",
            ));
        }
        if self.duration_minutes < MIN_DURATION_MINUTES {
            return Err(QuotationError::invalid(
                "duracionMinutos",
                self.duration_minutes,
                format!("must be at least {MIN_DURATION_MINUTES} minutes"),
            ));
        }
        if self.fieldworkers == 0 {
            return Err(QuotationError::invalid(
                "encuestadoresTotales",
                self.fieldworkers,
                "must be greater than zero",
            ));
        }
        if self.supervisors == 0 {
            return Err(QuotationError::invalid(
                "supervisores",
                self.supervisors,
                "must be greater than zero",
            ));
        }
        if let FieldworkSourcing::Subcontracted { cost } = &self.sourcing {
            if *cost < Decimal::ZERO {
                return Err(QuotationError::invalid("fuenteCampo.costo", cost, "must be >= 0"));
            }
        }
        Ok(())
    }
}

/// Caller-supplied field edits layered over stored inputs before a rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputChanges {
    #[serde(rename = "totalEntrevistas")]
    pub total_interviews: Option<u32>,
    #[serde(rename = "duracionMinutos")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "modalidad")]
    pub mode: Option<InterviewMode>,
    #[serde(rename = "penetracion")]
    pub penetration: Option<Penetration>,
    #[serde(rename = "cobertura")]
    pub coverage: Option<String>,
    #[serde(rename = "supervisores")]
    pub supervisors: Option<u32>,
    #[serde(rename = "encuestadoresTotales")]
    pub fieldworkers: Option<u32>,
    #[serde(rename = "elaboramosCuestionario")]
    pub author_questionnaire: Option<bool>,
    #[serde(rename = "elaboramosScript")]
    pub author_script: Option<bool>,
    #[serde(rename = "requiereInforme")]
    pub wants_report: Option<bool>,
    #[serde(rename = "requiereInformeBi")]
    pub wants_bi_report: Option<bool>,
    #[serde(rename = "olasBi")]
    pub bi_waves: Option<u32>,
    #[serde(rename = "fuenteCampo")]
    pub sourcing: Option<FieldworkSourcing>,
}

impl InputChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, stored: &QuotationInputs) -> QuotationInputs {
        let changes = self.clone();
        QuotationInputs {
            total_interviews: changes.total_interviews.unwrap_or(stored.total_interviews),
            duration_minutes: changes.duration_minutes.unwrap_or(stored.duration_minutes),
            mode: changes.mode.unwrap_or(stored.mode),
            penetration: changes.penetration.unwrap_or(stored.penetration),
            coverage: changes.coverage.unwrap_or_else(|| stored.coverage.clone()),
            supervisors: changes.supervisors.unwrap_or(stored.supervisors),
            fieldworkers: changes.fieldworkers.unwrap_or(stored.fieldworkers),
            author_questionnaire: changes
                .author_questionnaire
                .unwrap_or(stored.author_questionnaire),
            author_script: changes.author_script.unwrap_or(stored.author_script),
            wants_report: changes.wants_report.unwrap_or(stored.wants_report),
            wants_bi_report: changes.wants_bi_report.unwrap_or(stored.wants_bi_report),
            bi_waves: changes.bi_waves.unwrap_or(stored.bi_waves),
            sourcing: changes.sourcing.unwrap_or_else(|| stored.sourcing.clone()),
        }
    }
}
