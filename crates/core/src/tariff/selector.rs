use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::inputs::InterviewMode;
use crate::errors::QuotationError;
use crate::tariff::engine::{
    amss::AmssEngine, fully_urban::FullyUrbanEngine, national::NationalEngine,
    principal_cities::PrincipalCitiesEngine, DistributionEngine,
};
use crate::tariff::registry::RegionRegistry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    #[default]
    National,
    Amss,
    PrincipalCities,
    FullyUrban,
}

impl CoverageMode {
    pub const ALL: [CoverageMode; 4] =
        [Self::National, Self::Amss, Self::PrincipalCities, Self::FullyUrban];

    /// Strict resolution used by the quoting paths: unknown codes are an error.
    pub fn parse(code: &str) -> Result<Self, QuotationError> {
        match normalize(code).as_str() {
            "" | "nacional" | "national" => Ok(Self::National),
            other => Self::from_known(other).ok_or_else(|| QuotationError::UnsupportedCoverage {
                code: code.trim().to_owned(),
            }),
        }
    }

    /// Lenient resolution: anything unrecognised falls back to National.
    pub fn select(code: &str) -> Self {
        Self::from_known(&normalize(code)).unwrap_or_default()
    }

    /// Face-to-face fieldwork must name a supported mode; telephone and online studies
    /// fall back to National.
    pub fn resolve(code: &str, interview: InterviewMode) -> Result<Self, QuotationError> {
        match interview {
            InterviewMode::FaceToFace => Self::parse(code),
            InterviewMode::Telephone | InterviewMode::Online => Ok(Self::select(code)),
        }
    }

    fn from_known(normalized: &str) -> Option<Self> {
        match normalized {
            "nacional" | "national" => Some(Self::National),
            "amss" => Some(Self::Amss),
            "ciudades_principales" | "principal_cities" | "cabeceras" => {
                Some(Self::PrincipalCities)
            }
            "urbano" | "fully_urban" | "nacional_urbano" => Some(Self::FullyUrban),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::National => "nacional",
            Self::Amss => "amss",
            Self::PrincipalCities => "ciudades_principales",
            Self::FullyUrban => "urbano",
        }
    }
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Engine variant for `mode`, bound to the registry's constants.
pub fn engine_for(
    mode: CoverageMode,
    registry: &RegionRegistry,
) -> Box<dyn DistributionEngine + '_> {
    match mode {
        CoverageMode::National => Box::new(NationalEngine::new(registry)),
        CoverageMode::Amss => Box::new(AmssEngine::new(registry)),
        CoverageMode::PrincipalCities => Box::new(PrincipalCitiesEngine::new(registry)),
        CoverageMode::FullyUrban => Box::new(FullyUrbanEngine::new(registry)),
    }
}

#[cfg(test)]
mod tests {
    use super::{engine_for, CoverageMode};
    use crate::domain::inputs::InterviewMode;
    use crate::tariff::registry::RegionRegistry;

    #[test]
    fn select_normalizes_and_defaults_to_national() {
        assert_eq!(CoverageMode::select("  AMSS "), CoverageMode::Amss);
        assert_eq!(CoverageMode::select("Ciudades Principales"), CoverageMode::PrincipalCities);
        assert_eq!(CoverageMode::select("fully-urban"), CoverageMode::FullyUrban);
        assert_eq!(CoverageMode::select("oriente"), CoverageMode::National);
        assert_eq!(CoverageMode::select(""), CoverageMode::National);
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(CoverageMode::parse("Nacional").expect("known"), CoverageMode::National);
        assert_eq!(CoverageMode::parse("").expect("empty"), CoverageMode::National);
        let error = CoverageMode::parse(" oriente ").expect_err("unknown");
        assert_eq!(error.kind(), "unsupported_coverage");
        assert!(error.to_string().contains("oriente"));
    }

    #[test]
    fn resolve_is_strict_only_for_face_to_face() {
        let error = CoverageMode::resolve("oriente", InterviewMode::FaceToFace)
            .expect_err("face-to-face needs a known mode");
        assert_eq!(error.kind(), "unsupported_coverage");

        for interview in [InterviewMode::Telephone, InterviewMode::Online] {
            assert_eq!(
                CoverageMode::resolve("oriente", interview).expect("fallback"),
                CoverageMode::National
            );
            assert_eq!(
                CoverageMode::resolve("AMSS", interview).expect("known"),
                CoverageMode::Amss
            );
        }
    }

    #[test]
    fn codes_round_trip_through_parse() {
        for mode in CoverageMode::ALL {
            assert_eq!(CoverageMode::parse(mode.code()).expect("own code"), mode);
        }
    }

    #[test]
    fn engine_for_dispatches_by_mode() {
        let registry = RegionRegistry::builtin();
        for mode in CoverageMode::ALL {
            assert_eq!(engine_for(mode, &registry).mode(), mode);
        }
    }
}
