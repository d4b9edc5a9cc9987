use crate::error::MarkupError;
use graphbind_common::RangeSet;
use graphbind_components::PropValue;
use regex::Regex;
use std::sync::LazyLock;

/// Attribute names preserved verbatim for third-party CSS interop (flex-layout styling
/// reads them off the DOM by their original names).
const VERBATIM_ATTRIBUTES: &[&str] = &["data-flex-layout", "data-flex-self"];

/// Matches a signed decimal with optional fraction and exponent.
static NUMERIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").unwrap()
});

/// Decodes HTML/XML entities in a raw attribute value.
pub fn decode_attribute_value(raw: &str) -> Result<String, MarkupError> {
    quick_xml::escape::unescape(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|error| MarkupError::Parse {
            position: 0,
            message: format!("invalid entity in attribute value: {error}"),
        })
}

/// Converts a markup attribute name to a camel-cased prop name.
///
/// `class` maps to `className`; the `data-`/`x-` prefixes are stripped; kebab-case
/// segments are camel-cased. The `data-flex-*` attributes are preserved verbatim so the
/// flex-layout stylesheet still finds them.
pub fn attribute_to_prop_name(attribute: &str) -> String {
    if attribute == "class" {
        return "className".to_owned();
    }
    if VERBATIM_ATTRIBUTES.contains(&attribute) {
        return attribute.to_owned();
    }
    let stripped = attribute
        .strip_prefix("data-")
        .or_else(|| attribute.strip_prefix("x-"))
        .unwrap_or(attribute);
    kebab_to_camel(stripped)
}

/// Camel-cases a kebab-case name: `show-label` becomes `showLabel`.
pub(crate) fn kebab_to_camel(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// Coerces a decoded attribute value into a typed prop.
///
/// Boolean literals parse as booleans, numeric literals as numbers, and values that look
/// like a JSON object or array are parsed as JSON. Template interpolations (`{{...}}`,
/// `[[...]]`) are never JSON-parsed; they stay raw strings for the template engine.
/// Anything else stays a string.
pub fn coerce_prop_value(tag: &str, attribute: &str, value: &str) -> Result<PropValue, MarkupError> {
    match value {
        "true" => return Ok(PropValue::Bool(true)),
        "false" => return Ok(PropValue::Bool(false)),
        _ => {}
    }
    if NUMERIC_PATTERN.is_match(value) {
        if let Ok(number) = value.parse::<f64>() {
            return Ok(PropValue::Number(number));
        }
    }
    if looks_like_json(value) {
        let parsed = serde_json::from_str(value).map_err(|error| MarkupError::Json {
            tag: tag.to_owned(),
            attribute: attribute.to_owned(),
            message: error.to_string(),
        })?;
        return Ok(PropValue::Json(parsed));
    }
    Ok(PropValue::String(value.to_owned()))
}

/// Checks whether a value should be treated as a JSON object or array: it starts and ends
/// with a matching bracket pair and the opening bracket is not part of a template
/// interpolation.
fn looks_like_json(value: &str) -> bool {
    let trimmed = value.trim();
    let bracketed = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !bracketed {
        return false;
    }
    let offset = value.len() - value.trim_start().len();
    !interpolation_regions(value).intersects_range(offset, offset + 1)
}

/// Masks every `{{...}}` and `[[...]]` interpolation region of the value.
fn interpolation_regions(value: &str) -> RangeSet {
    let mut regions = RangeSet::new();
    for (open, close) in [("{{", "}}"), ("[[", "]]")] {
        let mut from = 0;
        while let Some(start) = value[from..].find(open) {
            let start = from + start;
            match value[start + open.len()..].find(close) {
                Some(end) => {
                    let end = start + open.len() + end + close.len();
                    regions.insert(start, end);
                    from = end;
                }
                None => break,
            }
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_maps_to_class_name() {
        assert_eq!(attribute_to_prop_name("class"), "className");
    }

    #[test]
    fn prefixes_are_stripped_and_kebab_camel_cased() {
        assert_eq!(attribute_to_prop_name("data-count"), "count");
        assert_eq!(attribute_to_prop_name("data-show-label"), "showLabel");
        assert_eq!(attribute_to_prop_name("x-custom-attr"), "customAttr");
        assert_eq!(attribute_to_prop_name("no-prefix"), "noPrefix");
    }

    #[test]
    fn flex_interop_attributes_stay_verbatim() {
        assert_eq!(attribute_to_prop_name("data-flex-layout"), "data-flex-layout");
        assert_eq!(attribute_to_prop_name("data-flex-self"), "data-flex-self");
    }

    #[test]
    fn coerces_booleans_and_numbers() {
        assert_eq!(
            coerce_prop_value("mp-x", "flag", "true").unwrap(),
            PropValue::Bool(true)
        );
        assert_eq!(
            coerce_prop_value("mp-x", "flag", "false").unwrap(),
            PropValue::Bool(false)
        );
        assert_eq!(
            coerce_prop_value("mp-x", "count", "42").unwrap(),
            PropValue::Number(42.0)
        );
        assert_eq!(
            coerce_prop_value("mp-x", "ratio", "-1.5e3").unwrap(),
            PropValue::Number(-1500.0)
        );
    }

    #[test]
    fn coerces_json_objects_and_arrays() {
        assert_eq!(
            coerce_prop_value("mp-x", "config", r#"{"a":1}"#).unwrap(),
            PropValue::Json(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            coerce_prop_value("mp-x", "items", r#"[1,2]"#).unwrap(),
            PropValue::Json(serde_json::json!([1, 2]))
        );
    }

    #[test]
    fn template_interpolations_stay_strings() {
        assert_eq!(
            coerce_prop_value("mp-x", "binding", "{{foo}}").unwrap(),
            PropValue::String("{{foo}}".to_owned())
        );
        assert_eq!(
            coerce_prop_value("mp-x", "binding", "[[bar]]").unwrap(),
            PropValue::String("[[bar]]".to_owned())
        );
        // JSON containing an interpolation inside a string value still parses.
        assert_eq!(
            coerce_prop_value("mp-x", "config", r#"{"label": "{{name}}"}"#).unwrap(),
            PropValue::Json(serde_json::json!({"label": "{{name}}"}))
        );
    }

    #[test]
    fn invalid_json_reports_tag_and_attribute() {
        let error = coerce_prop_value("mp-widget", "config", r#"{"a": }"#).unwrap_err();
        let MarkupError::Json { tag, attribute, .. } = error else {
            panic!("expected a JSON error, got {error}");
        };
        assert_eq!(tag, "mp-widget");
        assert_eq!(attribute, "config");
    }

    #[test]
    fn plain_text_stays_a_string() {
        assert_eq!(
            coerce_prop_value("mp-x", "label", "some text").unwrap(),
            PropValue::String("some text".to_owned())
        );
        // Mixed content is not numeric.
        assert_eq!(
            coerce_prop_value("mp-x", "label", "42abc").unwrap(),
            PropValue::String("42abc".to_owned())
        );
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_attribute_value("a &amp; b").unwrap(), "a & b");
        assert_eq!(decode_attribute_value("&quot;x&quot;").unwrap(), "\"x\"");
    }
}
