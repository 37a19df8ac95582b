use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::building_type::BuildingType;
use crate::schema::Attribute;

/// A stored or supplied attribute value. Records and predicates carry the
/// value as given; conversion to the kind an operator needs happens at
/// evaluation time and fails closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => value.is_finite().then_some(*value),
            Self::Text(raw) => parse_numeric_text(raw),
        }
    }

    pub fn to_upper_text(&self) -> String {
        self.to_string().to_uppercase()
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{value:.0}")
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn parse_numeric_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned = unsigned.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Scalar", into = "String")]
pub struct RecordId(pub String);

impl From<Scalar> for RecordId {
    fn from(value: Scalar) -> Self {
        Self(value.to_string())
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_type: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_size_sf: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Scalar>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId(id.into()),
            address: None,
            zoning: None,
            building_type: None,
            height: None,
            assessed_value: None,
            land_size_sf: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_value(mut self, attribute: Attribute, value: impl Into<Scalar>) -> Self {
        *self.slot_mut(attribute) = Some(value.into());
        self
    }

    pub fn value(&self, attribute: Attribute) -> Option<&Scalar> {
        match attribute {
            Attribute::Height => self.height.as_ref(),
            Attribute::AssessedValue => self.assessed_value.as_ref(),
            Attribute::LandSizeSf => self.land_size_sf.as_ref(),
            Attribute::Zoning => self.zoning.as_ref(),
            Attribute::BuildingType => self.building_type.as_ref(),
            Attribute::Address => self.address.as_ref(),
            Attribute::Latitude => self.latitude.as_ref(),
            Attribute::Longitude => self.longitude.as_ref(),
        }
    }

    fn slot_mut(&mut self, attribute: Attribute) -> &mut Option<Scalar> {
        match attribute {
            Attribute::Height => &mut self.height,
            Attribute::AssessedValue => &mut self.assessed_value,
            Attribute::LandSizeSf => &mut self.land_size_sf,
            Attribute::Zoning => &mut self.zoning,
            Attribute::BuildingType => &mut self.building_type,
            Attribute::Address => &mut self.address,
            Attribute::Latitude => &mut self.latitude,
            Attribute::Longitude => &mut self.longitude,
        }
    }

    fn derive_building_type(&mut self) {
        if self.building_type.is_some() {
            return;
        }
        if let Some(zoning) = &self.zoning {
            let derived = BuildingType::classify_zoning(&zoning.to_string());
            self.building_type = Some(Scalar::from(derived.as_str()));
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordSourceError {
    #[error("could not read records file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse records: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("duplicate record id `{0}`")]
    DuplicateId(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    Bare(Vec<Record>),
    Envelope { data: Vec<Record> },
}

/// Immutable, cheaply clonable view of a loaded record set. Evaluations hold
/// a reference to the slice and never mutate it.
#[derive(Clone, Debug, Default)]
pub struct RecordSnapshot {
    records: Arc<[Record]>,
}

impl RecordSnapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records: records.into() }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RecordSourceError> {
        let document =
            serde_json::from_str::<RecordDocument>(raw).map_err(RecordSourceError::Parse)?;
        let mut records = match document {
            RecordDocument::Bare(records) | RecordDocument::Envelope { data: records } => records,
        };

        let mut seen_ids = HashSet::new();
        for record in &mut records {
            if !seen_ids.insert(record.id.0.clone()) {
                return Err(RecordSourceError::DuplicateId(record.id.0.clone()));
            }
            record.derive_building_type();
        }

        Ok(Self::new(records))
    }

    pub fn load(path: &Path) -> Result<Self, RecordSourceError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RecordSourceError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
