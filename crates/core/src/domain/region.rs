use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::QuotationError;

/// Departments of El Salvador, the geographic unit every coverage mode draws its rows from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "Ahuachapán", alias = "Ahuachapan")]
    Ahuachapan,
    #[serde(rename = "Santa Ana")]
    SantaAna,
    #[serde(rename = "Sonsonate")]
    Sonsonate,
    #[serde(rename = "Chalatenango")]
    Chalatenango,
    #[serde(rename = "La Libertad")]
    LaLibertad,
    #[serde(rename = "San Salvador")]
    SanSalvador,
    #[serde(rename = "Cuscatlán", alias = "Cuscatlan")]
    Cuscatlan,
    #[serde(rename = "La Paz")]
    LaPaz,
    #[serde(rename = "Cabañas", alias = "Cabanas")]
    Cabanas,
    #[serde(rename = "San Vicente")]
    SanVicente,
    #[serde(rename = "Usulután", alias = "Usulutan")]
    Usulutan,
    #[serde(rename = "San Miguel")]
    SanMiguel,
    #[serde(rename = "Morazán", alias = "Morazan")]
    Morazan,
    #[serde(rename = "La Unión", alias = "La Union")]
    LaUnion,
}

impl Region {
    pub const ALL: [Region; 14] = [
        Self::Ahuachapan,
        Self::SantaAna,
        Self::Sonsonate,
        Self::Chalatenango,
        Self::LaLibertad,
        Self::SanSalvador,
        Self::Cuscatlan,
        Self::LaPaz,
        Self::Cabanas,
        Self::SanVicente,
        Self::Usulutan,
        Self::SanMiguel,
        Self::Morazan,
        Self::LaUnion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ahuachapan => "Ahuachapán",
            Self::SantaAna => "Santa Ana",
            Self::Sonsonate => "Sonsonate",
            Self::Chalatenango => "Chalatenango",
            Self::LaLibertad => "La Libertad",
            Self::SanSalvador => "San Salvador",
            Self::Cuscatlan => "Cuscatlán",
            Self::LaPaz => "La Paz",
            Self::Cabanas => "Cabañas",
            Self::SanVicente => "San Vicente",
            Self::Usulutan => "Usulután",
            Self::SanMiguel => "San Miguel",
            Self::Morazan => "Morazán",
            Self::LaUnion => "La Unión",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = QuotationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = fold_accents(value.trim());
        Self::ALL
            .into_iter()
            .find(|region| fold_accents(region.name()) == wanted)
            .ok_or_else(|| QuotationError::NotFound { region: value.trim().to_owned() })
    }
}

fn fold_accents(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::Region;

    #[test]
    fn parses_names_with_or_without_accents() {
        assert_eq!("Cabañas".parse::<Region>().expect("accented"), Region::Cabanas);
        assert_eq!("  la union ".parse::<Region>().expect("unaccented"), Region::LaUnion);
        assert_eq!("SAN SALVADOR".parse::<Region>().expect("upper"), Region::SanSalvador);
    }

    #[test]
    fn unknown_region_is_not_found() {
        let error = "Atlántida".parse::<Region>().expect_err("not a department");
        assert_eq!(error.kind(), "not_found");
    }

    #[test]
    fn serializes_with_display_name() {
        let json = serde_json::to_string(&Region::Usulutan).expect("serialize");
        assert_eq!(json, "\"Usulután\"");
        let parsed: Region = serde_json::from_str("\"Usulutan\"").expect("alias");
        assert_eq!(parsed, Region::Usulutan);
    }
}
