use serde_json::Value;

/// Interprets a list-valued form field. Clients send these either as a JSON array or, from multipart forms, as
/// a JSON-encoded string (`"[\"React\",\"Node\"]"`) or a comma-separated string, which is split and trimmed.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        Value::String(s) => match serde_json::from_str::<Vec<String>>(s) {
            Ok(items) => items,
            Err(_) if s.trim().is_empty() => vec![],
            Err(_) => s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect(),
        },
        _ => vec![],
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_fields_parse_from_arrays_and_strings() {
        assert_eq!(string_list(&json!(["React", "Node"])), vec!["React", "Node"]);
        assert_eq!(string_list(&json!("[\"React\",\"Node\"]")), vec!["React", "Node"]);
        assert_eq!(string_list(&json!("React")), vec!["React"]);
        assert_eq!(string_list(&json!("React, Node , ")), vec!["React", "Node"]);
        assert_eq!(string_list(&json!("")), Vec::<String>::new());
        assert_eq!(string_list(&json!(null)), Vec::<String>::new());
    }
}
