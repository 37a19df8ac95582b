//! Deterministic fallback interpreter.
//!
//! Detectors run in a fixed order over a lower-cased copy of the query. Each
//! one contributes at most one predicate, and a detector is skipped once
//! another detector of the same category has contributed.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use skyline_core::{Attribute, BuildingType, FilterSet, NumericExtractor, Operator, Predicate};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error(
    "Could not parse query. Try: \"buildings over 100 feet\", \"commercial buildings in NW\", \
     \"buildings on 17th avenue\", \"properties worth over $1 million\""
)]
pub struct Unparseable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum DetectorCategory {
    Quadrant,
    Street,
    Height,
    AssessedValue,
    LandSize,
    BuildingType,
    Zoning,
}

type Detect = fn(&QueryText, &NumericExtractor) -> Option<Predicate>;

const DETECTORS: &[(DetectorCategory, Detect)] = &[
    (DetectorCategory::Quadrant, quadrant),
    (DetectorCategory::Street, numbered_street),
    (DetectorCategory::Street, named_street),
    (DetectorCategory::Height, height),
    (DetectorCategory::AssessedValue, assessed_value),
    (DetectorCategory::LandSize, land_size),
    (DetectorCategory::BuildingType, building_type),
    (DetectorCategory::Zoning, zoning),
];

const QUADRANTS: [&str; 4] = ["nw", "ne", "sw", "se"];

const BUILDING_TYPE_KEYWORDS: &[(&str, BuildingType)] = &[
    ("commercial", BuildingType::Commercial),
    ("residential", BuildingType::Residential),
    ("industrial", BuildingType::Industrial),
    ("mixed use", BuildingType::MixedUse),
    ("mixed-use", BuildingType::MixedUse),
    ("special", BuildingType::SpecialPurpose),
];

// Keyword stems match at the start of a query word: "heights", "taller",
// "priced", "costs" and "lot sizes" all count.
const HEIGHT_STEMS: &[&str] = &["height", "tall"];
const LENGTH_UNITS: &[&str] = &["feet", "ft"];
const VALUE_STEMS: &[&str] = &["value", "worth", "assess", "cost", "price"];
const LAND_SIZE_STEMS: &[&str] = &["land size", "lot size", "square feet", "sq ft", "sqft"];

/// Phrases signalling a direction of comparison for one numeric attribute.
struct Comparison {
    greater: &'static [&'static str],
    less: &'static [&'static str],
}

const HEIGHT_COMPARISON: Comparison = Comparison {
    greater: &["over", "above", "greater", "more than", "taller"],
    less: &["under", "below", "less", "shorter"],
};

const VALUE_COMPARISON: Comparison = Comparison {
    greater: &["over", "above", "more", "greater", "exceeds"],
    less: &["under", "below", "less", "cheaper"],
};

const LAND_SIZE_COMPARISON: Comparison = Comparison {
    greater: &["over", "above", "more", "greater", "larger"],
    less: &["under", "below", "less", "smaller"],
};

static NUMBERED_STREET: OnceLock<Regex> = OnceLock::new();
static NAMED_STREET: OnceLock<Regex> = OnceLock::new();
static ZONING_CODE: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static detector pattern compiles"))
}

/// The query as the detectors see it: the original text for number
/// extraction, a lower-cased copy, and its alphanumeric words.
struct QueryText<'a> {
    original: &'a str,
    lowered: String,
    words: Vec<String>,
}

impl<'a> QueryText<'a> {
    fn new(original: &'a str) -> Self {
        let lowered = original.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        Self { original, lowered, words }
    }

    /// Whole-word match of a space-separated phrase.
    fn has_phrase(&self, phrase: &str) -> bool {
        let parts = phrase.split(' ').collect::<Vec<_>>();
        self.words.windows(parts.len()).any(|window| {
            window.iter().zip(&parts).all(|(word, part)| word == part)
        })
    }

    /// Like `has_phrase`, but each query word need only begin with the
    /// phrase word, so "lot sizes" satisfies "lot size" and "100ft" satisfies "ft".
    fn has_stem_phrase(&self, phrase: &str) -> bool {
        let parts = phrase.split(' ').collect::<Vec<_>>();
        self.words.windows(parts.len()).any(|window| {
            window.iter().zip(&parts).all(|(word, part)| unit_of(word).starts_with(part))
        })
    }

    fn has_any_stem(&self, stems: &[&str]) -> bool {
        stems.iter().any(|stem| self.has_stem_phrase(stem))
    }

    fn has_any_phrase(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.has_phrase(phrase))
    }

    fn comparison(&self, comparison: &Comparison) -> Option<Operator> {
        if self.has_any_phrase(comparison.greater) {
            Some(Operator::GreaterThan)
        } else if self.has_any_phrase(comparison.less) {
            Some(Operator::LessThan)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedParser {
    numbers: NumericExtractor,
}

impl RuleBasedParser {
    pub fn new() -> Self {
        Self { numbers: NumericExtractor::new() }
    }

    pub fn parse(&self, text: &str) -> Result<FilterSet, Unparseable> {
        let query = QueryText::new(text);
        let mut contributed = HashSet::new();
        let mut predicates = Vec::new();

        for (category, detect) in DETECTORS {
            if contributed.contains(category) {
                continue;
            }
            if let Some(predicate) = detect(&query, &self.numbers) {
                debug!(
                    event_name = "rules.detector.matched",
                    category = ?category,
                    predicate = %predicate,
                    "rule detector contributed a predicate"
                );
                contributed.insert(*category);
                predicates.push(predicate);
            }
        }

        FilterSet::new(predicates).map_err(|_| Unparseable)
    }
}

fn quadrant(query: &QueryText, _: &NumericExtractor) -> Option<Predicate> {
    let words = &query.words;
    let mentions = |quad: &str| {
        words.iter().enumerate().any(|(index, word)| {
            if word != quad {
                return false;
            }
            let previous = index.checked_sub(1).map(|i| words[i].as_str());
            let before_previous = index.checked_sub(2).map(|i| words[i].as_str());
            let next = words.get(index + 1).map(String::as_str);

            previous == Some("in")
                || (previous == Some("the") && before_previous == Some("in"))
                || matches!(next, Some("calgary") | Some("area"))
                || (next.is_none() && index > 0)
        })
    };

    QUADRANTS.into_iter().find(|&quad| mentions(quad)).map(|quad| {
        Predicate::new(Attribute::Address.as_str(), Operator::EndsWith, quad.to_uppercase())
    })
}

fn numbered_street(query: &QueryText, _: &NumericExtractor) -> Option<Predicate> {
    let street = pattern(
        &NUMBERED_STREET,
        r"\bon\s+(\d+)(st|nd|rd|th)?\b\s*(street|avenue|ave|av|st)?\b",
    );
    street
        .captures_iter(&query.lowered)
        .find(|captures| captures.get(2).is_some() || captures.get(3).is_some())
        .and_then(|captures| captures.get(1))
        .map(|number| {
            Predicate::new(Attribute::Address.as_str(), Operator::Contains, number.as_str())
        })
}

fn named_street(query: &QueryText, _: &NumericExtractor) -> Option<Predicate> {
    let street = pattern(
        &NAMED_STREET,
        r"\bon\s+([a-z]+)\s+(?:street|avenue|ave|st|road|rd|drive|dr|way|blvd|boulevard)\b",
    );
    let captures = street.captures(&query.lowered)?;
    let name = captures.get(1)?.as_str().to_uppercase();
    Some(Predicate::new(Attribute::Address.as_str(), Operator::Contains, name))
}

fn height(query: &QueryText, numbers: &NumericExtractor) -> Option<Predicate> {
    let words = &query.words;
    let mentions_height = words.iter().enumerate().any(|(index, word)| {
        let unit = unit_of(word);
        if HEIGHT_STEMS.iter().any(|stem| unit.starts_with(stem)) {
            return true;
        }
        if !LENGTH_UNITS.iter().any(|stem| unit.starts_with(stem)) {
            return false;
        }
        let previous = index.checked_sub(1).map(|i| words[i].as_str());
        !matches!(previous, Some("square") | Some("sq"))
    });
    if !mentions_height {
        return None;
    }

    numeric_predicate(query, numbers, Attribute::Height, &HEIGHT_COMPARISON)
}

fn assessed_value(query: &QueryText, numbers: &NumericExtractor) -> Option<Predicate> {
    let mentions_value = query.has_any_stem(VALUE_STEMS) || query.lowered.contains('$');
    if !mentions_value {
        return None;
    }

    numeric_predicate(query, numbers, Attribute::AssessedValue, &VALUE_COMPARISON)
}

fn land_size(query: &QueryText, numbers: &NumericExtractor) -> Option<Predicate> {
    if !query.has_any_stem(LAND_SIZE_STEMS) {
        return None;
    }

    numeric_predicate(query, numbers, Attribute::LandSizeSf, &LAND_SIZE_COMPARISON)
}

fn building_type(query: &QueryText, _: &NumericExtractor) -> Option<Predicate> {
    BUILDING_TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| query.lowered.contains(keyword))
        .map(|(_, kind)| {
            Predicate::new(Attribute::BuildingType.as_str(), Operator::Equals, kind.as_str())
        })
}

fn zoning(query: &QueryText, _: &NumericExtractor) -> Option<Predicate> {
    let code = pattern(&ZONING_CODE, r"\b([a-z]{1,3}-[a-z0-9]+)\b");
    let captures = code.captures(&query.lowered)?;
    let designation = captures.get(1)?.as_str().to_uppercase();
    Some(Predicate::new(Attribute::Zoning.as_str(), Operator::Contains, designation))
}

fn numeric_predicate(
    query: &QueryText,
    numbers: &NumericExtractor,
    attribute: Attribute,
    comparison: &Comparison,
) -> Option<Predicate> {
    let value = numbers.extract(query.original)?;
    let operator = query.comparison(comparison)?;
    Some(Predicate::new(attribute.as_str(), operator, value))
}

/// Strips a leading magnitude so "100ft" reads as "ft".
fn unit_of(word: &str) -> &str {
    word.trim_start_matches(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use skyline_core::{FilterSet, Operator, Predicate, Scalar};

    use super::{RuleBasedParser, Unparseable};

    fn parse(text: &str) -> Vec<Predicate> {
        RuleBasedParser::new().parse(text).map(FilterSet::into_predicates).expect("parsable query")
    }

    fn predicate(attribute: &str, operator: Operator, value: impl Into<Scalar>) -> Predicate {
        Predicate::new(attribute, operator, value)
    }

    #[test]
    fn height_and_building_type() {
        assert_eq!(
            parse("buildings over 100 feet and commercial type"),
            vec![
                predicate("height", Operator::GreaterThan, 100.0),
                predicate("building_type", Operator::Equals, "Commercial"),
            ]
        );
    }

    #[test]
    fn quadrant_phrases() {
        let nw = vec![predicate("address", Operator::EndsWith, "NW")];
        assert_eq!(parse("show buildings in the NW"), nw);
        assert_eq!(parse("towers in nw?"), nw);
        assert_eq!(parse("offices nw calgary"), nw);
        assert_eq!(
            parse("homes around the SE area"),
            vec![predicate("address", Operator::EndsWith, "SE")]
        );
        assert_eq!(parse("buildings sw"), vec![predicate("address", Operator::EndsWith, "SW")]);
    }

    #[test]
    fn quadrant_requires_whole_word() {
        assert_eq!(RuleBasedParser::new().parse("anything new in newcastle"), Err(Unparseable));
    }

    #[test]
    fn numbered_street_drops_ordinal_suffix() {
        assert_eq!(
            parse("buildings on 17th avenue"),
            vec![predicate("address", Operator::Contains, "17")]
        );
        assert_eq!(parse("shops on 1st st"), vec![predicate("address", Operator::Contains, "1")]);
    }

    #[test]
    fn named_street_is_upper_cased() {
        assert_eq!(
            parse("buildings on centre street"),
            vec![predicate("address", Operator::Contains, "CENTRE")]
        );
    }

    #[test]
    fn numbered_street_suppresses_named_street() {
        let predicates = parse("on 4th street or on macleod trail or on stephen ave");
        assert_eq!(predicates, vec![predicate("address", Operator::Contains, "4")]);
    }

    #[test]
    fn combines_type_height_and_quadrant_in_precedence_order() {
        assert_eq!(
            parse("commercial buildings over 50 feet in NE"),
            vec![
                predicate("address", Operator::EndsWith, "NE"),
                predicate("height", Operator::GreaterThan, 50.0),
                predicate("building_type", Operator::Equals, "Commercial"),
            ]
        );
    }

    #[test]
    fn height_below_threshold() {
        assert_eq!(
            parse("structures shorter than 30ft"),
            vec![predicate("height", Operator::LessThan, 30.0)]
        );
    }

    #[test]
    fn assessed_value_with_scaled_numbers() {
        assert_eq!(
            parse("properties worth over $1 million"),
            vec![predicate("assessed_value", Operator::GreaterThan, 1_000_000.0)]
        );
        assert_eq!(
            parse("homes cheaper than $500k"),
            vec![predicate("assessed_value", Operator::LessThan, 500_000.0)]
        );
    }

    #[test]
    fn square_feet_is_land_size_not_height() {
        assert_eq!(
            parse("large lots over 5000 square feet"),
            vec![predicate("land_size_sf", Operator::GreaterThan, 5000.0)]
        );
        assert_eq!(
            parse("lot size smaller than 2,000"),
            vec![predicate("land_size_sf", Operator::LessThan, 2000.0)]
        );
    }

    #[test]
    fn inflected_keywords_still_trigger_detectors() {
        assert_eq!(
            parse("buildings priced under 500k"),
            vec![predicate("assessed_value", Operator::LessThan, 500_000.0)]
        );
        assert_eq!(
            parse("heights over 100"),
            vec![predicate("height", Operator::GreaterThan, 100.0)]
        );
        assert_eq!(
            parse("properties with values over 2 million"),
            vec![predicate("assessed_value", Operator::GreaterThan, 2_000_000.0)]
        );
        assert_eq!(
            parse("lot sizes above 2000"),
            vec![predicate("land_size_sf", Operator::GreaterThan, 2000.0)]
        );
        assert_eq!(
            parse("costs less than 300k"),
            vec![predicate("assessed_value", Operator::LessThan, 300_000.0)]
        );
    }

    #[test]
    fn keyword_stems_anchor_at_word_start() {
        assert_eq!(RuleBasedParser::new().parse("turn left over 100"), Err(Unparseable));
    }

    #[test]
    fn number_without_direction_contributes_nothing() {
        assert_eq!(RuleBasedParser::new().parse("buildings 100 feet"), Err(Unparseable));
    }

    #[test]
    fn building_type_first_keyword_wins() {
        assert_eq!(
            parse("mixed-use or residential"),
            vec![predicate("building_type", Operator::Equals, "Residential")]
        );
        assert_eq!(
            parse("special purpose sites"),
            vec![predicate("building_type", Operator::Equals, "Special Purpose")]
        );
    }

    #[test]
    fn zoning_code_is_upper_cased() {
        assert_eq!(
            parse("RC-G zoned properties"),
            vec![predicate("zoning", Operator::Contains, "RC-G")]
        );
        assert_eq!(parse("zoned m-c1"), vec![predicate("zoning", Operator::Contains, "M-C1")]);
    }

    #[test]
    fn unrecognized_text_fails_with_guidance() {
        let error = RuleBasedParser::new().parse("hello").expect_err("nothing to detect");
        let message = error.to_string();
        assert!(message.contains("buildings over 100 feet"));
        assert!(message.contains("properties worth over $1 million"));
    }
}
