use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    Commercial,
    Residential,
    Industrial,
    #[serde(rename = "Mixed Use")]
    MixedUse,
    #[serde(rename = "Special Purpose")]
    SpecialPurpose,
    Other,
}

impl BuildingType {
    pub const ALL: [BuildingType; 6] = [
        BuildingType::Commercial,
        BuildingType::Residential,
        BuildingType::Industrial,
        BuildingType::MixedUse,
        BuildingType::SpecialPurpose,
        BuildingType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commercial => "Commercial",
            Self::Residential => "Residential",
            Self::Industrial => "Industrial",
            Self::MixedUse => "Mixed Use",
            Self::SpecialPurpose => "Special Purpose",
            Self::Other => "Other",
        }
    }

    /// Land-use designation prefix to building category, as published by the
    /// open-data source.
    pub fn classify_zoning(zoning: &str) -> Self {
        let zoning = zoning.trim().to_ascii_uppercase();
        if zoning.starts_with("C-") {
            Self::Commercial
        } else if zoning.starts_with("I-") {
            Self::Industrial
        } else if ["R-", "M-", "RM", "R1"].iter().any(|prefix| zoning.starts_with(prefix)) {
            Self::Residential
        } else if zoning.starts_with("MU") {
            Self::MixedUse
        } else if zoning.starts_with("S-") || zoning.starts_with("P-") {
            Self::SpecialPurpose
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
