//! Attribute schema for property records.
//!
//! Every filterable attribute has exactly one value kind, and any number of
//! aliases that users or the model may use to refer to it. Resolution is
//! case-insensitive and ignores surrounding whitespace.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Height,
    AssessedValue,
    LandSizeSf,
    Zoning,
    BuildingType,
    Address,
    Latitude,
    Longitude,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Numeric,
    Text,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Height,
        Attribute::AssessedValue,
        Attribute::LandSizeSf,
        Attribute::Zoning,
        Attribute::BuildingType,
        Attribute::Address,
        Attribute::Latitude,
        Attribute::Longitude,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::AssessedValue => "assessed_value",
            Self::LandSizeSf => "land_size_sf",
            Self::Zoning => "zoning",
            Self::BuildingType => "building_type",
            Self::Address => "address",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Height
            | Self::AssessedValue
            | Self::LandSizeSf
            | Self::Latitude
            | Self::Longitude => AttributeKind::Numeric,
            Self::Zoning | Self::BuildingType | Self::Address => AttributeKind::Text,
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALIASES: &[(&str, Attribute)] = &[
    ("height", Attribute::Height),
    ("assessed_value", Attribute::AssessedValue),
    ("assessed", Attribute::AssessedValue),
    ("value", Attribute::AssessedValue),
    ("land_size_sf", Attribute::LandSizeSf),
    ("land_size", Attribute::LandSizeSf),
    ("lot_size", Attribute::LandSizeSf),
    ("lot_size_sf", Attribute::LandSizeSf),
    ("zoning", Attribute::Zoning),
    ("zone", Attribute::Zoning),
    ("land_use", Attribute::Zoning),
    ("land_use_designation", Attribute::Zoning),
    ("building_type", Attribute::BuildingType),
    ("type", Attribute::BuildingType),
    ("address", Attribute::Address),
    ("street", Attribute::Address),
    ("latitude", Attribute::Latitude),
    ("lat", Attribute::Latitude),
    ("longitude", Attribute::Longitude),
    ("lon", Attribute::Longitude),
    ("lng", Attribute::Longitude),
];

/// Static lookup table over [`Attribute`]; holds no state.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttributeSchema;

impl AttributeSchema {
    pub fn resolve(name: &str) -> Option<Attribute> {
        let normalized = name.trim().to_ascii_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized.as_str())
            .map(|(_, attribute)| *attribute)
    }

    pub fn kind_of(attribute: Attribute) -> AttributeKind {
        attribute.kind()
    }

    pub fn attributes() -> &'static [Attribute] {
        &Attribute::ALL
    }

    pub fn aliases_of(attribute: Attribute) -> impl Iterator<Item = &'static str> {
        ALIASES
            .iter()
            .filter(move |(alias, target)| *target == attribute && *alias != attribute.as_str())
            .map(|(alias, _)| *alias)
    }
}
