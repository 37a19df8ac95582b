use skyline_core::{Attribute, AttributeSchema, BuildingType};

const WORKED_EXAMPLES: &[(&str, &str)] = &[
    (
        "buildings over 100 feet and commercial type",
        r#"{"filters": [{"attribute": "height", "operator": ">", "value": 100}, {"attribute": "building_type", "operator": "equals", "value": "Commercial"}]}"#,
    ),
    (
        "show buildings in the NW",
        r#"{"filters": [{"attribute": "address", "operator": "endswith", "value": "NW"}]}"#,
    ),
    (
        "commercial buildings on centre street in NE",
        r#"{"filters": [{"attribute": "building_type", "operator": "equals", "value": "Commercial"}, {"attribute": "address", "operator": "contains", "value": "CENTRE"}, {"attribute": "address", "operator": "endswith", "value": "NE"}]}"#,
    ),
    (
        "buildings worth over 1 million",
        r#"{"filters": [{"attribute": "assessed_value", "operator": ">", "value": 1000000}]}"#,
    ),
    (
        "large lots over 5000 square feet",
        r#"{"filters": [{"attribute": "land_size_sf", "operator": ">", "value": 5000}]}"#,
    ),
    (
        "RC-G zoned properties",
        r#"{"filters": [{"attribute": "zoning", "operator": "contains", "value": "RC-G"}]}"#,
    ),
];

fn attribute_note(attribute: Attribute) -> String {
    match attribute {
        Attribute::Height => "height (in feet, numeric)".to_string(),
        Attribute::AssessedValue => "assessed_value (in dollars, numeric)".to_string(),
        Attribute::LandSizeSf => "land_size_sf (land size in square feet, numeric)".to_string(),
        Attribute::Zoning => {
            r#"zoning (land-use designation string like "RC-G", "C-COR1", "M-C1")"#.to_string()
        }
        Attribute::BuildingType => {
            let names = BuildingType::ALL.iter().map(BuildingType::as_str).collect::<Vec<_>>();
            format!("building_type (one of: {})", names.join(", "))
        }
        Attribute::Address => {
            r#"address (full street address ending in its quadrant, e.g. "10101 SOUTHPORT RD SW")"#
                .to_string()
        }
        Attribute::Latitude => "latitude (decimal degrees, numeric)".to_string(),
        Attribute::Longitude => "longitude (decimal degrees, numeric)".to_string(),
    }
}

fn attribute_line(attribute: Attribute) -> String {
    let aliases = AttributeSchema::aliases_of(attribute).collect::<Vec<_>>();
    if aliases.is_empty() {
        format!("- {}\n", attribute_note(attribute))
    } else {
        format!("- {}; also called {}\n", attribute_note(attribute), aliases.join(", "))
    }
}

/// Instruction sent ahead of every user query: schema, operator vocabulary,
/// quadrant convention and worked examples.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You translate questions about a Calgary property database into filters. \
         Extract ALL filter criteria from the query.\n\nThe database has these attributes:\n",
    );

    for &attribute in AttributeSchema::attributes() {
        prompt.push_str(&attribute_line(attribute));
    }

    prompt.push_str(
        "\nCalgary addresses end with a quadrant: NW, NE, SW, SE.\n\n\
         Return ONLY a JSON object with a \"filters\" array. Each filter has:\n\
         - \"attribute\": the database field to filter on\n\
         - \"operator\": one of \">\", \"<\", \">=\", \"<=\", \"==\", \"!=\" for numeric fields, \
         or \"contains\", \"equals\", \"startswith\", \"endswith\" for text fields\n\
         - \"value\": the value to compare against\n\n\
         For location queries:\n\
         - \"in the NW\" or \"in NW\" -> {\"attribute\": \"address\", \"operator\": \"endswith\", \"value\": \"NW\"}\n\
         - \"on 17th avenue\" -> {\"attribute\": \"address\", \"operator\": \"contains\", \"value\": \"17\"}\n\
         - \"on Stephen Ave\" -> {\"attribute\": \"address\", \"operator\": \"contains\", \"value\": \"STEPHEN\"}\n\n\
         Examples:\n",
    );

    for (query, response) in WORKED_EXAMPLES {
        prompt.push_str(&format!("Query: \"{query}\"\nResponse: {response}\n\n"));
    }

    prompt.push_str("Respond with ONLY the JSON object, no other text or explanation.");
    prompt
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use skyline_core::Attribute;

    use super::{system_prompt, WORKED_EXAMPLES};

    #[test]
    fn prompt_lists_every_attribute_and_operator() {
        let prompt = system_prompt();
        for attribute in Attribute::ALL {
            assert!(prompt.contains(attribute.as_str()), "missing {attribute}");
        }
        for operator in ["\">=\"", "\"!=\"", "\"startswith\"", "\"endswith\"", "\"contains\""] {
            assert!(prompt.contains(operator), "missing {operator}");
        }
        assert!(prompt.contains("Mixed Use"));
    }

    #[test]
    fn attribute_lines_mention_aliases() {
        let prompt = system_prompt();
        assert!(prompt.contains("- address (full street address"));
        let address_line = prompt
            .lines()
            .find(|line| line.starts_with("- address"))
            .expect("address line");
        assert!(address_line.ends_with("; also called street"), "got {address_line}");
    }

    #[test]
    fn worked_examples_are_valid_filter_documents() {
        for (query, response) in WORKED_EXAMPLES {
            let value = serde_json::from_str::<Value>(response).expect("example should be JSON");
            let filters = value["filters"].as_array().expect("filters array");
            assert!(!filters.is_empty(), "example for {query} has no filters");
        }
    }
}
