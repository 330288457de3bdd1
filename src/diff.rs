//! Update previews: line diff between the registered and desired schema

use similar::TextDiff;

use crate::schema::SchemaType;

/// Render a schema body in a stable form for diffing
///
/// JSON and Avro bodies are pretty-printed with sorted keys so that only
/// semantic changes show up. Anything that does not parse is left as text.
pub fn canonical_text(body: &str, schema_type: SchemaType) -> String {
    if schema_type.is_structured() {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                return pretty + "\n";
            }
        }
    }
    let mut text = body.trim().to_string();
    text.push('\n');
    text
}

/// Unified diff from the registered schema to the desired one
pub fn schema_diff(subject: &str, registered: &str, desired: &str, schema_type: SchemaType) -> String {
    let old_text = canonical_text(registered, schema_type);
    let new_text = canonical_text(desired, schema_type);

    TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{} (registered)", subject), &format!("{} (desired)", subject))
        .to_string()
}
