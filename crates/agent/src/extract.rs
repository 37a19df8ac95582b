use serde_json::{json, Value};

/// Isolates the filter object from a model completion that may wrap it in a
/// fenced block or surround it with prose.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseExtractor;

impl ResponseExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns an object with a `filters` array, or `None`. A bare predicate
    /// object is wrapped into a one-element `filters` array.
    pub fn extract(&self, text: &str) -> Option<Value> {
        let interior = fenced_interior(text.trim());

        let start = interior.find('{')?;
        let end = interior.rfind('}')?;
        if end <= start {
            return None;
        }

        let value = serde_json::from_str::<Value>(&interior[start..=end]).ok()?;
        let object = value.as_object()?;

        if object.get("filters").is_some_and(Value::is_array) {
            return Some(value);
        }
        if object.contains_key("attribute") {
            return Some(json!({ "filters": [value] }));
        }
        None
    }
}

fn fenced_interior(text: &str) -> &str {
    let (marker, marker_len) = if let Some(index) = text.find("```json") {
        (index, "```json".len())
    } else if let Some(index) = text.find("```") {
        (index, "```".len())
    } else {
        return text;
    };

    let body = &text[marker + marker_len..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ResponseExtractor;

    #[test]
    fn extracts_plain_object() {
        let value = ResponseExtractor::new()
            .extract(r#"{"filters": [{"attribute": "height", "operator": ">", "value": 100}]}"#)
            .expect("object");
        assert_eq!(value["filters"][0]["attribute"], "height");
    }

    #[test]
    fn extracts_from_json_fence_with_prose() {
        let text = "Sure! Here is the filter:\n```json\n{\"filters\": [{\"attribute\": \"address\", \"operator\": \"endswith\", \"value\": \"NW\"}]}\n```\nLet me know if you need more.";
        let value = ResponseExtractor::new().extract(text).expect("object");
        assert_eq!(value["filters"][0]["value"], "NW");
    }

    #[test]
    fn extracts_from_bare_fence() {
        let text = "```\n{\"filters\": []}\n```";
        assert_eq!(ResponseExtractor::new().extract(text), Some(json!({"filters": []})));
    }

    #[test]
    fn extracts_from_unterminated_fence() {
        let text = "```json\n{\"filters\": [{\"attribute\": \"zoning\", \"operator\": \"contains\", \"value\": \"RC-G\"}]}";
        assert!(ResponseExtractor::new().extract(text).is_some());
    }

    #[test]
    fn wraps_single_predicate_object() {
        let value = ResponseExtractor::new()
            .extract(r#"The answer is {"attribute": "height", "operator": "<", "value": 50}."#)
            .expect("object");
        assert_eq!(
            value,
            json!({"filters": [{"attribute": "height", "operator": "<", "value": 50}]})
        );
    }

    #[test]
    fn prose_without_braces_yields_none() {
        assert_eq!(ResponseExtractor::new().extract("I cannot help with that."), None);
        assert_eq!(ResponseExtractor::new().extract("} backwards {"), None);
    }

    #[test]
    fn malformed_json_yields_none() {
        assert_eq!(ResponseExtractor::new().extract("{\"filters\": [ {\"attribute\": }"), None);
    }

    #[test]
    fn unrelated_objects_yield_none() {
        assert_eq!(ResponseExtractor::new().extract(r#"{"answer": 42}"#), None);
        assert_eq!(ResponseExtractor::new().extract(r#"{"filters": "height > 100"}"#), None);
    }
}
