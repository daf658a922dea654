//! Field-level summary of a device update
//!
//! Compares the before and after snapshots kept in an `update` entry. Device
//! snapshots serialize flat, and empty optional fields (`description`,
//! `notes`, the maintenance and repair dates) are left out entirely, so a
//! field that was set or cleared shows `(none)` on the empty side.

use std::collections::BTreeSet;

use serde_json::Value;

/// Longest string value shown before it is cut with `...`
const MAX_SHOWN_CHARS: usize = 50;

/// Describe what changed between two device snapshots
///
/// Produces `field: old -> new` pairs in field-name order, joined with
/// `", "`, or `None` when the snapshots are equal.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let (Value::Object(old), Value::Object(new)) = (before, after) else {
        return (before != after)
            .then(|| format!("{} -> {}", describe(Some(before)), describe(Some(after))));
    };

    let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let changes: Vec<String> = fields
        .into_iter()
        .filter_map(|field| {
            let (was, now) = (old.get(field), new.get(field));
            (was != now).then(|| format!("{}: {} -> {}", field, describe(was), describe(now)))
        })
        .collect();

    (!changes.is_empty()).then(|| changes.join(", "))
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(none)".to_string(),
        Some(Value::String(s)) if s.chars().count() > MAX_SHOWN_CHARS => {
            let head: String = s.chars().take(MAX_SHOWN_CHARS - 3).collect();
            format!("\"{}...\"", head)
        }
        Some(Value::String(s)) => format!("\"{}\"", s),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(fields)) => format!("{{{} fields}}", fields.len()),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_change() {
        let before = json!({"name": "Printer", "status": "active"});
        let after = json!({"name": "Printer", "status": "maintenance"});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "status: \"active\" -> \"maintenance\"");
    }

    #[test]
    fn test_optional_field_set_and_cleared() {
        let before = json!({"name": "Printer", "description": "Tầng 2"});
        let after = json!({"name": "Printer", "notes": "needs toner"});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(
            diff,
            "description: \"Tầng 2\" -> (none), notes: (none) -> \"needs toner\""
        );
    }

    #[test]
    fn test_identical_snapshots() {
        let value = json!({"name": "Printer", "status": "active"});
        assert!(generate_diff(&value, &value).is_none());
    }

    #[test]
    fn test_unchanged_fields_left_out() {
        let before = json!({"name": "A", "type": "Máy in", "condition": "tốt"});
        let after = json!({"name": "B", "type": "Máy in", "condition": "kém"});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "condition: \"tốt\" -> \"kém\", name: \"A\" -> \"B\"");
    }

    #[test]
    fn test_long_description_is_cut_on_a_char_boundary() {
        let before = json!({"description": "ă".repeat(100)});
        let after = json!({"description": "short"});

        let diff = generate_diff(&before, &after).unwrap();
        let expected = format!("description: \"{}...\" -> \"short\"", "ă".repeat(47));
        assert_eq!(diff, expected);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(None), "(none)");
        assert_eq!(describe(Some(&json!(null))), "(none)");
        assert_eq!(describe(Some(&json!(true))), "true");
        assert_eq!(describe(Some(&json!(42))), "42");
        assert_eq!(describe(Some(&json!("2024-05-01"))), "\"2024-05-01\"");
        assert_eq!(describe(Some(&json!([1, 2, 3]))), "[3 items]");
        assert_eq!(describe(Some(&json!({"a": 1, "b": 2}))), "{2 fields}");
    }
}
