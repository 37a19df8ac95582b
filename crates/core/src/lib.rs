//! Core of the skyline property-query system.
//!
//! - `schema` declares the filterable attributes, their kinds and aliases.
//! - `domain` holds records, predicates and filter sets.
//! - `numeric` extracts magnitudes ("500k", "$2,500", "1 million") from text.
//! - `evaluate` applies a filter set to a record slice.
//!
//! Nothing in this crate performs I/O beyond loading configuration and
//! reading a records file on request.

pub mod config;
pub mod domain;
pub mod errors;
pub mod evaluate;
pub mod numeric;
pub mod schema;

pub use domain::building_type::BuildingType;
pub use domain::filter::{FilterSet, Operator, Predicate};
pub use domain::record::{Record, RecordId, RecordSnapshot, RecordSourceError, Scalar};
pub use errors::{ApplicationError, DomainError};
pub use evaluate::{Evaluation, FilterEvaluator};
pub use numeric::NumericExtractor;
pub use schema::{Attribute, AttributeKind, AttributeSchema};
