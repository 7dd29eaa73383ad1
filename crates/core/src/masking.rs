//! Presentation-layer masking for sensitive field values.
//!
//! Masking only affects what is displayed. The raw value is still returned
//! alongside it, so this is not access control.

use serde_json::Value;

use crate::collections::CollectionSpec;
use crate::types::Record;

/// Prefix shown in place of the hidden portion of a value.
pub const MASK_PREFIX: &str = "****";

/// Number of trailing characters left visible.
pub const VISIBLE_SUFFIX_CHARS: usize = 4;

/// Render `value` as `****` followed by its last four characters.
///
/// Values shorter than four characters render as `****` alone. Counting is
/// done on `char`s so multi-byte input never splits a code point.
pub fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count < VISIBLE_SUFFIX_CHARS {
        return MASK_PREFIX.to_string();
    }
    let suffix: String = value.chars().skip(count - VISIBLE_SUFFIX_CHARS).collect();
    format!("{MASK_PREFIX}{suffix}")
}

/// Build the `display` object for a row: every masked field of `spec` that
/// holds a string is rendered through [`mask`]. Other fields are omitted.
pub fn display_row(spec: &CollectionSpec, row: &Record) -> Record {
    let mut display = Record::new();
    for field in spec.masked_fields() {
        if let Some(Value::String(raw)) = row.get(field.name) {
            display.insert(field.name.to_string(), Value::String(mask(raw)));
        }
    }
    display
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::collections;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask("EAAGm0PX4ZCpsBAKZAxyz1234"), "****1234");
    }

    #[test]
    fn exactly_four_chars_shows_all_four() {
        assert_eq!(mask("abcd"), "****abcd");
    }

    #[test]
    fn short_values_do_not_panic() {
        assert_eq!(mask(""), "****");
        assert_eq!(mask("a"), "****");
        assert_eq!(mask("abc"), "****");
    }

    #[test]
    fn multibyte_suffix_is_char_aware() {
        assert_eq!(mask("tokenñáéí"), "****ñáéí");
    }

    #[test]
    fn output_length_is_prefix_plus_four_for_long_inputs() {
        for len in 4..40 {
            let value: String = "x".repeat(len);
            assert_eq!(mask(&value).chars().count(), 8);
        }
    }

    #[test]
    fn display_row_only_renders_masked_fields() {
        let spec = collections::find(collections::TOKEN_STORE).unwrap();
        let row = json!({
            "platform": "facebook",
            "accessToken": "EAAB-secret-9876",
        });
        let display = display_row(spec, row.as_object().unwrap());
        assert_eq!(display.len(), 1);
        assert_eq!(display["accessToken"], "****9876");
    }

    #[test]
    fn display_row_skips_non_string_values() {
        let spec = collections::find(collections::TOKEN_STORE).unwrap();
        let row = json!({ "accessToken": null });
        assert!(display_row(spec, row.as_object().unwrap()).is_empty());
    }
}
