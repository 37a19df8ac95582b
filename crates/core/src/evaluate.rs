//! Filter evaluation over an immutable record slice.
//!
//! Every anomaly (missing value, failed coercion, operator of the wrong
//! kind, unknown attribute) resolves to "predicate does not match"; nothing
//! here returns an error.

use serde::Serialize;
use tracing::debug;

use crate::domain::filter::{FilterSet, Operator, Predicate};
use crate::domain::record::{Record, RecordId, Scalar};
use crate::schema::AttributeKind;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub matching_ids: Vec<RecordId>,
    pub count: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FilterEvaluator;

impl FilterEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, records: &[Record], filter: &FilterSet) -> Evaluation {
        let matching_ids = records
            .iter()
            .filter(|record| self.matches(record, filter))
            .map(|record| record.id.clone())
            .collect::<Vec<_>>();
        let count = matching_ids.len();

        debug!(
            event_name = "evaluator.completed",
            predicate_count = filter.predicates().len(),
            record_count = records.len(),
            match_count = count,
            "filter evaluated"
        );

        Evaluation { matching_ids, count }
    }

    pub fn matches(&self, record: &Record, filter: &FilterSet) -> bool {
        filter.predicates().iter().all(|predicate| self.test(record, predicate))
    }

    pub fn test(&self, record: &Record, predicate: &Predicate) -> bool {
        let Some(attribute) = predicate.resolved_attribute() else {
            return false;
        };
        let Some(stored) = record.value(attribute) else {
            return false;
        };
        if predicate.operator.kind() != Some(attribute.kind()) {
            return false;
        }

        match attribute.kind() {
            AttributeKind::Numeric => compare_numbers(stored, &predicate.operator, &predicate.value),
            AttributeKind::Text => match_text(stored, &predicate.operator, &predicate.value),
        }
    }
}

fn compare_numbers(stored: &Scalar, operator: &Operator, expected: &Scalar) -> bool {
    let (Some(left), Some(right)) = (stored.as_number(), expected.as_number()) else {
        return false;
    };

    match operator {
        Operator::GreaterThan => left > right,
        Operator::LessThan => left < right,
        Operator::GreaterOrEqual => left >= right,
        Operator::LessOrEqual => left <= right,
        Operator::Equal => left == right,
        Operator::NotEqual => left != right,
        _ => false,
    }
}

fn match_text(stored: &Scalar, operator: &Operator, expected: &Scalar) -> bool {
    let haystack = stored.to_upper_text();
    let needle = expected.to_upper_text();

    match operator {
        Operator::Contains => haystack.contains(&needle),
        Operator::Equals => haystack == needle,
        Operator::StartsWith => haystack.starts_with(&needle),
        Operator::EndsWith => haystack.ends_with(&needle),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::FilterEvaluator;
    use crate::domain::filter::{FilterSet, Operator, Predicate};
    use crate::domain::record::{Record, RecordId};
    use crate::schema::Attribute;

    fn building(id: &str, height: f64, building_type: &str, address: &str) -> Record {
        Record::new(id)
            .with_value(Attribute::Height, height)
            .with_value(Attribute::BuildingType, building_type)
            .with_value(Attribute::Address, address)
    }

    fn filter(predicates: Vec<Predicate>) -> FilterSet {
        FilterSet::new(predicates).expect("non-empty filter")
    }

    fn ids(values: &[&str]) -> Vec<RecordId> {
        values.iter().map(|value| RecordId((*value).to_string())).collect()
    }

    #[test]
    fn height_and_type_conjunction() {
        let records = vec![
            building("tall", 120.0, "Commercial", "1 MAIN ST NW"),
            building("short", 80.0, "Commercial", "2 MAIN ST NW"),
            building("tall-home", 150.0, "Residential", "3 MAIN ST NW"),
        ];
        let filter = filter(vec![
            Predicate::new("height", Operator::GreaterThan, 100.0),
            Predicate::new("building_type", Operator::Equals, "Commercial"),
        ]);

        let evaluation = FilterEvaluator::new().evaluate(&records, &filter);
        assert_eq!(evaluation.matching_ids, ids(&["tall"]));
        assert_eq!(evaluation.count, 1);
    }

    #[test]
    fn conjunction_matches_iff_every_predicate_matches() {
        let evaluator = FilterEvaluator::new();
        let records = vec![
            building("a", 120.0, "Commercial", "100 5 AVE NW"),
            building("b", 120.0, "Industrial", "100 5 AVE NW"),
            building("c", 90.0, "Commercial", "100 5 AVE SW"),
            Record::new("d").with_value(Attribute::Address, "9 CENTRE ST NE"),
        ];
        let predicates = vec![
            Predicate::new("height", Operator::GreaterOrEqual, 100.0),
            Predicate::new("type", Operator::Equals, "commercial"),
            Predicate::new("address", Operator::EndsWith, "nw"),
        ];
        let filter = filter(predicates.clone());

        for record in &records {
            let individually = predicates.iter().all(|predicate| evaluator.test(record, predicate));
            assert_eq!(evaluator.matches(record, &filter), individually, "record {}", record.id);
        }
        assert_eq!(evaluator.evaluate(&records, &filter).matching_ids, ids(&["a"]));
    }

    #[test]
    fn quadrant_suffix_matching() {
        let records = vec![
            building("nw", 10.0, "Other", "100 5 AVE NW"),
            building("sw", 10.0, "Other", "100 5 AVE SW"),
        ];
        let filter = filter(vec![Predicate::new("address", Operator::EndsWith, "NW")]);

        let evaluation = FilterEvaluator::new().evaluate(&records, &filter);
        assert_eq!(evaluation.matching_ids, ids(&["nw"]));
    }

    #[test]
    fn missing_values_exclude_records() {
        let records = vec![Record::new("bare"), building("full", 200.0, "Commercial", "X")];
        let filter = filter(vec![Predicate::new("height", Operator::NotEqual, 1.0)]);

        let evaluation = FilterEvaluator::new().evaluate(&records, &filter);
        assert_eq!(evaluation.matching_ids, ids(&["full"]));
    }

    #[test]
    fn non_numeric_stored_value_fails_closed() {
        let records = vec![
            Record::new("text").with_value(Attribute::Height, "very tall"),
            Record::new("numeric-text").with_value(Attribute::Height, "1,200"),
        ];
        let filter = filter(vec![Predicate::new("height", Operator::GreaterThan, 100.0)]);

        let evaluation = FilterEvaluator::new().evaluate(&records, &filter);
        assert_eq!(evaluation.matching_ids, ids(&["numeric-text"]));
    }

    #[test]
    fn non_numeric_comparison_value_fails_closed() {
        let records = vec![building("a", 120.0, "Commercial", "X")];
        let filter = filter(vec![Predicate::new("height", Operator::GreaterThan, "tall")]);

        assert!(FilterEvaluator::new().evaluate(&records, &filter).matching_ids.is_empty());
    }

    #[test]
    fn alias_and_canonical_names_are_equivalent() {
        let records = vec![
            Record::new("rich").with_value(Attribute::AssessedValue, 2_000_000.0),
            Record::new("modest").with_value(Attribute::AssessedValue, 400_000.0),
            Record::new("unknown"),
        ];
        let evaluator = FilterEvaluator::new();
        let by_alias = filter(vec![Predicate::new("value", Operator::GreaterThan, 1_000_000.0)]);
        let by_name =
            filter(vec![Predicate::new("assessed_value", Operator::GreaterThan, 1_000_000.0)]);

        assert_eq!(evaluator.evaluate(&records, &by_alias), evaluator.evaluate(&records, &by_name));
    }

    #[test]
    fn operator_of_wrong_kind_never_matches() {
        let records = vec![building("a", 120.0, "Commercial", "120 MAIN ST")];
        let evaluator = FilterEvaluator::new();

        let text_op_on_number = filter(vec![Predicate::new("height", Operator::Contains, "12")]);
        let number_op_on_text = filter(vec![Predicate::new("address", Operator::GreaterThan, 1.0)]);
        let unsupported =
            filter(vec![Predicate::new("address", Operator::parse("like"), "MAIN")]);
        let unknown_attribute =
            filter(vec![Predicate::new("colour", Operator::Equals, "red")]);

        for filter in [text_op_on_number, number_op_on_text, unsupported, unknown_attribute] {
            assert!(evaluator.evaluate(&records, &filter).matching_ids.is_empty());
        }
    }

    #[test]
    fn text_operators_are_case_insensitive() {
        let records = vec![
            Record::new("z").with_value(Attribute::Zoning, "c-cor1"),
            Record::new("y").with_value(Attribute::Zoning, "RC-G"),
        ];
        let evaluator = FilterEvaluator::new();

        let contains = filter(vec![Predicate::new("zone", Operator::Contains, "C-COR")]);
        let starts = filter(vec![Predicate::new("zoning", Operator::StartsWith, "rc")]);
        let equals = filter(vec![Predicate::new("zoning", Operator::parse("="), "Rc-g")]);

        assert_eq!(evaluator.evaluate(&records, &contains).matching_ids, ids(&["z"]));
        assert_eq!(evaluator.evaluate(&records, &starts).matching_ids, ids(&["y"]));
        assert_eq!(evaluator.evaluate(&records, &equals).matching_ids, ids(&["y"]));
    }

    #[test]
    fn numeric_text_predicate_value_is_coerced() {
        let records = vec![Record::new("lot").with_value(Attribute::LandSizeSf, 6000.0)];
        let filter = filter(vec![Predicate::new("lot_size", Operator::LessOrEqual, "6,000")]);

        assert_eq!(FilterEvaluator::new().evaluate(&records, &filter).count, 1);
    }

    #[test]
    fn evaluation_is_idempotent_and_order_preserving() {
        let records = (0..20)
            .map(|index| building(&format!("b{index}"), f64::from(index) * 10.0, "Commercial", "X"))
            .collect::<Vec<_>>();
        let filter = filter(vec![Predicate::new("height", Operator::GreaterThan, 55.0)]);
        let evaluator = FilterEvaluator::new();

        let first = evaluator.evaluate(&records, &filter);
        let second = evaluator.evaluate(&records, &filter);
        assert_eq!(first, second);
        let expected = (6..20).map(|index| RecordId(format!("b{index}"))).collect::<Vec<_>>();
        assert_eq!(first.matching_ids, expected);
    }
}
