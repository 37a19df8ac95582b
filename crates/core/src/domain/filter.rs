use serde::{Deserialize, Serialize};

use crate::domain::record::Scalar;
use crate::errors::DomainError;
use crate::schema::{Attribute, AttributeKind, AttributeSchema};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    NotEqual,
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    /// Kept verbatim so the filter can be echoed back; never matches.
    Unsupported(String),
}

impl Operator {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            ">" => Self::GreaterThan,
            "<" => Self::LessThan,
            ">=" => Self::GreaterOrEqual,
            "<=" => Self::LessOrEqual,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "contains" => Self::Contains,
            "equals" | "=" => Self::Equals,
            "startswith" | "starts_with" => Self::StartsWith,
            "endswith" | "ends_with" => Self::EndsWith,
            _ => Self::Unsupported(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Unsupported(raw) => raw,
        }
    }

    /// The attribute kind this operator applies to; `None` for operators
    /// outside the vocabulary.
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            Self::GreaterThan
            | Self::LessThan
            | Self::GreaterOrEqual
            | Self::LessOrEqual
            | Self::Equal
            | Self::NotEqual => Some(AttributeKind::Numeric),
            Self::Contains | Self::Equals | Self::StartsWith | Self::EndsWith => {
                Some(AttributeKind::Text)
            }
            Self::Unsupported(_) => None,
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub attribute: String,
    pub operator: Operator,
    pub value: Scalar,
}

impl Predicate {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Scalar>) -> Self {
        Self { attribute: attribute.into(), operator, value: value.into() }
    }

    pub fn resolved_attribute(&self) -> Option<Attribute> {
        AttributeSchema::resolve(&self.attribute)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.value)
    }
}

/// Non-empty conjunction of predicates, serialized as `{"filters": [...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterSetDocument")]
pub struct FilterSet {
    filters: Vec<Predicate>,
}

#[derive(Deserialize)]
struct FilterSetDocument {
    filters: Vec<Predicate>,
}

impl TryFrom<FilterSetDocument> for FilterSet {
    type Error = DomainError;

    fn try_from(document: FilterSetDocument) -> Result<Self, Self::Error> {
        Self::new(document.filters)
    }
}

impl FilterSet {
    pub fn new(filters: Vec<Predicate>) -> Result<Self, DomainError> {
        if filters.is_empty() {
            return Err(DomainError::EmptyFilterSet);
        }
        Ok(Self { filters })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn into_predicates(self) -> Vec<Predicate> {
        self.filters
    }
}
