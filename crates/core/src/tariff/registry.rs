use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::region::Region;
use crate::tariff::selector::CoverageMode;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not read region registry `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse region registry `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("region registry validation failed: {0}")]
    Invalid(String),
}

/// Throughput constants shared by every coverage mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldworkModel {
    pub sample_buffer: Decimal,
    pub days_buffer: Decimal,
    pub online_factor: Decimal,
    pub segment_size: u32,
    pub filter_minutes: Decimal,
    pub search_minutes: Decimal,
    pub travel_minutes: Decimal,
    pub group_size: u32,
    pub supervisor_split: u32,
    pub vehicle_capacity: u32,
}

impl Default for FieldworkModel {
    fn default() -> Self {
        Self {
            sample_buffer: Decimal::new(105, 2),
            days_buffer: Decimal::new(105, 2),
            online_factor: Decimal::new(15, 2),
            segment_size: 5,
            filter_minutes: Decimal::from(2),
            search_minutes: Decimal::from(10),
            travel_minutes: Decimal::from(30),
            group_size: 4,
            supervisor_split: 2,
            vehicle_capacity: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: Region,
    pub urban_weight: Decimal,
    #[serde(default)]
    pub rural_weight: Decimal,
    pub effective_hours: Decimal,
    pub per_diem_unit: Decimal,
    pub transport_unit: Decimal,
    #[serde(default)]
    pub lodging_unit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageProfile {
    pub supervisor_daily_rate: Decimal,
    /// Replaces the price-table lookup when set.
    #[serde(default)]
    pub fixed_ticket_price: Option<Decimal>,
    pub regions: Vec<RegionProfile>,
}

impl CoverageProfile {
    pub fn region(&self, region: Region) -> Option<&RegionProfile> {
        self.regions.iter().find(|profile| profile.region == region)
    }
}

/// Read-only per-mode configuration: region sets, weights, hours and unit costs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionRegistry {
    pub model: FieldworkModel,
    pub national: CoverageProfile,
    pub amss: CoverageProfile,
    pub principal_cities: CoverageProfile,
    pub fully_urban: CoverageProfile,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// (region, urban %, rural %, effective hours, per-diem, transport, lodging), money in cents
type RegionSeed = (Region, i64, i64, i64, i64, i64, i64);

const NATIONAL_SEED: [RegionSeed; 14] = [
    (Region::Ahuachapan, 310, 260, 600, 800, 4500, 1500),
    (Region::SantaAna, 630, 355, 650, 700, 4000, 0),
    (Region::Sonsonate, 440, 330, 650, 700, 4000, 0),
    (Region::Chalatenango, 135, 185, 600, 800, 4500, 1500),
    (Region::LaLibertad, 930, 295, 700, 600, 3000, 0),
    (Region::SanSalvador, 2335, 95, 700, 500, 2500, 0),
    (Region::Cuscatlan, 245, 160, 650, 600, 3000, 0),
    (Region::LaPaz, 295, 255, 650, 600, 3500, 0),
    (Region::Cabanas, 115, 155, 600, 800, 4500, 1500),
    (Region::SanVicente, 150, 155, 650, 700, 4000, 0),
    (Region::Usulutan, 300, 315, 600, 800, 4500, 1500),
    (Region::SanMiguel, 495, 320, 600, 800, 5000, 1500),
    (Region::Morazan, 115, 195, 550, 800, 5500, 2000),
    (Region::LaUnion, 170, 260, 550, 800, 5500, 2000),
];

const PRINCIPAL_CITIES_SEED: [RegionSeed; 7] = [
    (Region::SanSalvador, 4000, 0, 700, 500, 2500, 0),
    (Region::LaLibertad, 1500, 0, 700, 600, 3000, 0),
    (Region::SantaAna, 1400, 0, 650, 700, 4000, 0),
    (Region::SanMiguel, 1200, 0, 600, 800, 5000, 1500),
    (Region::Sonsonate, 800, 0, 650, 700, 4000, 0),
    (Region::Usulutan, 600, 0, 600, 800, 4500, 1500),
    (Region::Ahuachapan, 500, 0, 600, 800, 4500, 1500),
];

const AMSS_SEED: [RegionSeed; 1] = [(Region::SanSalvador, 10000, 0, 800, 400, 3500, 0)];

fn hundredths(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn profiles(seed: &[RegionSeed]) -> Vec<RegionProfile> {
    seed.iter()
        .map(|(region, urban, rural, hours, per_diem, transport, lodging)| RegionProfile {
            region: *region,
            urban_weight: hundredths(*urban),
            rural_weight: hundredths(*rural),
            effective_hours: hundredths(*hours),
            per_diem_unit: hundredths(*per_diem),
            transport_unit: hundredths(*transport),
            lodging_unit: hundredths(*lodging),
        })
        .collect()
}

impl RegionRegistry {
    pub fn builtin() -> Self {
        Self {
            model: FieldworkModel::default(),
            national: CoverageProfile {
                supervisor_daily_rate: Decimal::from(25),
                fixed_ticket_price: None,
                regions: profiles(&NATIONAL_SEED),
            },
            amss: CoverageProfile {
                supervisor_daily_rate: Decimal::from(20),
                fixed_ticket_price: Some(Decimal::new(250, 2)),
                regions: profiles(&AMSS_SEED),
            },
            principal_cities: CoverageProfile {
                supervisor_daily_rate: Decimal::from(25),
                fixed_ticket_price: None,
                regions: profiles(&PRINCIPAL_CITIES_SEED),
            },
            fully_urban: CoverageProfile {
                supervisor_daily_rate: Decimal::from(25),
                fixed_ticket_price: None,
                regions: profiles(&NATIONAL_SEED),
            },
        }
    }

    pub fn profile(&self, mode: CoverageMode) -> &CoverageProfile {
        match mode {
            CoverageMode::National => &self.national,
            CoverageMode::Amss => &self.amss,
            CoverageMode::PrincipalCities => &self.principal_cities,
            CoverageMode::FullyUrban => &self.fully_urban,
        }
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, RegistryError> {
        let registry = toml::from_str::<Self>(raw)
            .map_err(|source| RegistryError::ParseFile { path: path.to_path_buf(), source })?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RegistryError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        validate_model(&self.model)?;
        for mode in CoverageMode::ALL {
            validate_profile(mode, self.profile(mode))?;
        }
        if self.amss.regions.len() != 1 {
            return Err(RegistryError::Invalid(
                "amss must define exactly one region".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_model(model: &FieldworkModel) -> Result<(), RegistryError> {
    let counts = [
        ("segment_size", model.segment_size),
        ("group_size", model.group_size),
        ("supervisor_split", model.supervisor_split),
        ("vehicle_capacity", model.vehicle_capacity),
    ];
    if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
        return Err(RegistryError::Invalid(format!("model.{name} must be greater than zero")));
    }

    if model.sample_buffer <= Decimal::ZERO || model.days_buffer <= Decimal::ZERO {
        return Err(RegistryError::Invalid("model buffers must be greater than zero".to_string()));
    }
    if model.online_factor <= Decimal::ZERO || model.online_factor > Decimal::ONE {
        return Err(RegistryError::Invalid("model.online_factor must be within (0, 1]".to_string()));
    }
    let minutes = [model.filter_minutes, model.search_minutes, model.travel_minutes];
    if minutes.iter().any(|value| *value < Decimal::ZERO) {
        return Err(RegistryError::Invalid("model minutes must be >= 0".to_string()));
    }
    Ok(())
}

fn validate_profile(mode: CoverageMode, profile: &CoverageProfile) -> Result<(), RegistryError> {
    if profile.regions.is_empty() {
        return Err(RegistryError::Invalid(format!("{mode} has no regions")));
    }
    if profile.supervisor_daily_rate < Decimal::ZERO {
        return Err(RegistryError::Invalid(format!("{mode}.supervisor_daily_rate must be >= 0")));
    }
    if profile.fixed_ticket_price.is_some_and(|price| price <= Decimal::ZERO) {
        return Err(RegistryError::Invalid(format!("{mode}.fixed_ticket_price must be > 0")));
    }

    let mut seen = BTreeSet::new();
    let mut weight_sum = Decimal::ZERO;
    for region in &profile.regions {
        if !seen.insert(region.region) {
            return Err(RegistryError::Invalid(format!(
                "{mode} lists `{}` more than once",
                region.region
            )));
        }
        let money = [
            region.urban_weight,
            region.rural_weight,
            region.per_diem_unit,
            region.transport_unit,
            region.lodging_unit,
        ];
        if money.iter().any(|value| *value < Decimal::ZERO) {
            return Err(RegistryError::Invalid(format!(
                "{mode}/{}: weights and unit costs must be >= 0",
                region.region
            )));
        }
        if region.effective_hours <= Decimal::ZERO {
            return Err(RegistryError::Invalid(format!(
                "{mode}/{}: effective_hours must be greater than zero",
                region.region
            )));
        }
        weight_sum += region.urban_weight;
    }

    if mode != CoverageMode::Amss && weight_sum <= Decimal::ZERO {
        return Err(RegistryError::Invalid(format!("{mode} has no positive urban weight")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{RegionRegistry, RegistryError};
    use crate::domain::region::Region;
    use crate::tariff::selector::CoverageMode;

    #[test]
    fn builtin_registry_is_valid() {
        RegionRegistry::builtin().validate().expect("builtin registry validates");
    }

    #[test]
    fn national_weights_cover_the_whole_country() {
        let registry = RegionRegistry::builtin();
        let total: Decimal = registry
            .national
            .regions
            .iter()
            .map(|region| region.urban_weight + region.rural_weight)
            .sum();
        assert_eq!(total, Decimal::ONE_HUNDRED);
        assert_eq!(registry.national.regions.len(), Region::ALL.len());
    }

    #[test]
    fn amss_is_a_single_flat_region() {
        let registry = RegionRegistry::builtin();
        let amss = registry.profile(CoverageMode::Amss);
        assert_eq!(amss.regions.len(), 1);
        let region = &amss.regions[0];
        assert_eq!(region.region, Region::SanSalvador);
        assert_eq!(region.effective_hours, Decimal::from(8));
        assert_eq!(region.lodging_unit, Decimal::ZERO);
        assert_eq!(amss.fixed_ticket_price, Some(Decimal::new(25, 1)));
    }

    #[test]
    fn partial_toml_overrides_only_named_sections() {
        let raw = r#"
[model]
sample_buffer = "1.10"
days_buffer = "1.05"
online_factor = "0.15"
segment_size = 6
filter_minutes = "2"
search_minutes = "10"
travel_minutes = "30"
group_size = 4
supervisor_split = 2
vehicle_capacity = 5
"#;
        let registry =
            RegionRegistry::from_toml_str(raw, Path::new("inline.toml")).expect("parse registry");
        assert_eq!(registry.model.sample_buffer, Decimal::new(110, 2));
        assert_eq!(registry.model.segment_size, 6);
        assert_eq!(registry.national, RegionRegistry::builtin().national);
    }

    #[test]
    fn load_reads_file_and_rejects_duplicate_regions() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("regions.toml");
        fs::write(
            &path,
            r#"
[principal_cities]
supervisor_daily_rate = "30"

[[principal_cities.regions]]
region = "San Salvador"
urban_weight = "60"
effective_hours = "7"
per_diem_unit = "5"
transport_unit = "25"

[[principal_cities.regions]]
region = "San Salvador"
urban_weight = "40"
effective_hours = "7"
per_diem_unit = "5"
transport_unit = "25"
"#,
        )
        .expect("write registry");

        let error = RegionRegistry::load(&path).expect_err("duplicate region");
        assert!(matches!(
            error,
            RegistryError::Invalid(ref message) if message.contains("more than once")
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let error = RegionRegistry::load(Path::new("/nonexistent/regions.toml"))
            .expect_err("missing file");
        assert!(matches!(error, RegistryError::ReadFile { .. }));
    }

    #[test]
    fn registry_round_trips_through_toml() {
        let registry = RegionRegistry::builtin();
        let raw = toml::to_string(&registry).expect("serialize registry");
        let parsed =
            RegionRegistry::from_toml_str(&raw, Path::new("roundtrip.toml")).expect("parse");
        assert_eq!(parsed, registry);
    }
}
