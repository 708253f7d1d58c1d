//! Alias-tolerant field access for payload sections
//!
//! A field can arrive under several spellings. Lookup order:
//!
//! 1. flat snake_case (`bloom_intensity`)
//! 2. flat camelCase (`bloomIntensity`)
//! 3. nested snake_case (`bloom.intensity`)
//! 4. nested camelCase (`bloom.intensity` with a camelCase group or field)
//!
//! The first spelling whose value coerces to the requested type wins.
//! Values that are present but malformed are skipped, so a later spelling
//! can still supply the field.
//!
//! A field with several names is read through an array of [`FieldKey`]s:
//! the flat spellings of every key come before any nested spelling.

use pneumo_core::{Color, UnitRule};
use serde_json::{Map, Value};
use smallvec::SmallVec;

/// Name of a payload field and its optional nested spelling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldKey {
    /// Flat snake_case name
    pub name: &'static str,
    /// `(group, field)` for the nested spelling
    pub nested: Option<(&'static str, &'static str)>,
}

impl FieldKey {
    pub const fn flat(name: &'static str) -> Self {
        Self { name, nested: None }
    }

    pub const fn nested(name: &'static str, group: &'static str, field: &'static str) -> Self {
        Self {
            name,
            nested: Some((group, field)),
        }
    }
}

/// One or more keys naming the same field
pub trait FieldKeys {
    fn keys(&self) -> &[FieldKey];
}

impl FieldKeys for FieldKey {
    fn keys(&self) -> &[FieldKey] {
        std::slice::from_ref(self)
    }
}

impl<const N: usize> FieldKeys for [FieldKey; N] {
    fn keys(&self) -> &[FieldKey] {
        self
    }
}

/// Convert `snake_case` to `camelCase`
pub fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Numeric coercion: numbers, booleans (1/0) and numeric strings
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Boolean coercion: booleans, numbers (non-zero is true) and the usual
/// words
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read-only view of one payload section
#[derive(Clone, Copy, Debug, Default)]
pub struct SectionReader<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> SectionReader<'a> {
    /// View a JSON object directly
    pub fn new(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    /// View a named section of a payload root
    pub fn section(payload: &'a Value, name: &str) -> Self {
        Self::new(payload).child(name)
    }

    /// Whether this section exists as an object
    pub fn is_present(&self) -> bool {
        self.map.is_some()
    }

    /// Nested object, looked up by snake_case then camelCase name
    pub fn child(&self, name: &str) -> SectionReader<'a> {
        let map = self.get(name).and_then(Value::as_object);
        SectionReader { map }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        let map = self.map?;
        map.get(name).or_else(|| {
            let camel = to_camel_case(name);
            if camel != name {
                map.get(&camel)
            } else {
                None
            }
        })
    }

    /// Present spellings of a field, in precedence order
    fn candidates(&self, keys: &[FieldKey]) -> SmallVec<[&'a Value; 4]> {
        let mut found = SmallVec::new();
        let Some(map) = self.map else {
            return found;
        };

        for key in keys {
            if let Some(v) = map.get(key.name) {
                found.push(v);
            }
            let camel = to_camel_case(key.name);
            if camel != key.name {
                if let Some(v) = map.get(&camel) {
                    found.push(v);
                }
            }
        }

        for (group, field) in keys.iter().filter_map(|key| key.nested) {
            let Some(nested_map) = self.child(group).map else {
                continue;
            };
            if let Some(v) = nested_map.get(field) {
                found.push(v);
            }
            let camel_field = to_camel_case(field);
            if camel_field != field {
                if let Some(v) = nested_map.get(&camel_field) {
                    found.push(v);
                }
            }
        }

        found
    }

    /// Raw value of the first present spelling
    pub fn raw(&self, key: impl FieldKeys) -> Option<&'a Value> {
        self.candidates(key.keys()).into_iter().next()
    }

    /// First spelling that `parse` accepts
    pub fn parse<T>(&self, key: impl FieldKeys, parse: impl FnMut(&'a Value) -> Option<T>) -> Option<T> {
        self.candidates(key.keys()).into_iter().find_map(parse)
    }

    /// Finite number
    pub fn number(&self, key: impl FieldKeys) -> Option<f32> {
        self.candidates(key.keys())
            .into_iter()
            .find_map(coerce_number)
            .map(|v| v as f32)
    }

    /// Length converted through a unit rule
    pub fn length(&self, key: impl FieldKeys, rule: UnitRule) -> Option<f32> {
        self.number(key).map(|v| rule.apply(v))
    }

    /// Non-negative integer count, rounded
    pub fn count(&self, key: impl FieldKeys) -> Option<u32> {
        self.number(key)
            .map(|v| v.round().clamp(0.0, u32::MAX as f32) as u32)
    }

    pub fn flag(&self, key: impl FieldKeys) -> Option<bool> {
        self.candidates(key.keys()).into_iter().find_map(coerce_bool)
    }

    pub fn text(&self, key: impl FieldKeys) -> Option<&'a str> {
        self.candidates(key.keys()).into_iter().find_map(Value::as_str)
    }

    /// `#rrggbb` / `#rrggbbaa` colour
    pub fn color(&self, key: impl FieldKeys) -> Option<Color> {
        self.candidates(key.keys())
            .into_iter()
            .filter_map(Value::as_str)
            .find_map(|s| s.parse::<Color>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("bloom_intensity"), "bloomIntensity");
        assert_eq!(to_camel_case("ssao_radius_mm"), "ssaoRadiusMm");
        assert_eq!(to_camel_case("fov"), "fov");
    }

    #[test]
    fn test_alias_precedence() {
        let payload = json!({
            "bloom_intensity": 0.1,
            "bloomIntensity": 0.2,
            "bloom": { "intensity": 0.3 }
        });
        let reader = SectionReader::new(&payload);
        let key = FieldKey::nested("bloom_intensity", "bloom", "intensity");
        assert_eq!(reader.number(key), Some(0.1));

        let payload = json!({ "bloomIntensity": 0.2, "bloom": { "intensity": 0.3 } });
        assert_eq!(SectionReader::new(&payload).number(key), Some(0.2));

        let payload = json!({ "bloom": { "intensity": 0.3 } });
        assert_eq!(SectionReader::new(&payload).number(key), Some(0.3));
    }

    #[test]
    fn test_malformed_spelling_falls_through() {
        let payload = json!({
            "motion_blur": { "enabled": true },
        });
        let reader = SectionReader::new(&payload);
        let key = FieldKey::nested("motion_blur", "motion_blur", "enabled");
        assert_eq!(reader.flag(key), Some(true));
    }

    #[test]
    fn test_key_list_reads_flat_before_nested() {
        let keys = [
            FieldKey::nested("dof_blur", "dof", "blur"),
            FieldKey::nested("depth_of_field_blur", "depth_of_field", "blur"),
        ];

        let payload = json!({ "dof": { "blur": 2 }, "depthOfFieldBlur": 4 });
        assert_eq!(SectionReader::new(&payload).number(keys), Some(4.0));

        let payload = json!({ "depthOfField": { "blur": 6 } });
        assert_eq!(SectionReader::new(&payload).number(keys), Some(6.0));

        let payload = json!({ "dof": { "blur": "wide" }, "depth_of_field": { "blur": 8 } });
        assert_eq!(SectionReader::new(&payload).number(keys), Some(8.0));
    }

    #[test]
    fn test_nested_camel_case() {
        let payload = json!({ "keyLight": { "angleX": -20 } });
        let reader = SectionReader::new(&payload);
        let key = FieldKey::nested("key_angle_x", "key_light", "angle_x");
        assert_eq!(reader.number(key), Some(-20.0));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(coerce_number(&json!("1.5")), Some(1.5));
        assert_eq!(coerce_number(&json!(false)), Some(0.0));
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(null)), None);

        assert_eq!(coerce_bool(&json!("ON")), Some(true));
        assert_eq!(coerce_bool(&json!(0)), Some(false));
        assert_eq!(coerce_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_count_rounds_and_floors_at_zero() {
        let payload = json!({ "samples": 7.6, "negative": -4 });
        let reader = SectionReader::new(&payload);
        assert_eq!(reader.count(FieldKey::flat("samples")), Some(8));
        assert_eq!(reader.count(FieldKey::flat("negative")), Some(0));
    }

    #[test]
    fn test_missing_section() {
        let payload = json!({ "camera": 5 });
        let reader = SectionReader::section(&payload, "camera");
        assert!(!reader.is_present());
        assert_eq!(reader.number(FieldKey::flat("fov")), None);
    }

    #[test]
    fn test_color_and_length() {
        let payload = json!({ "color": "#ff0000", "bore_head": 0.08 });
        let reader = SectionReader::new(&payload);
        assert_eq!(reader.color(FieldKey::flat("color")), Some(Color::RED));
        assert_eq!(
            reader.length(FieldKey::flat("bore_head"), UnitRule::MILLIMETERS),
            Some(80.0)
        );
    }

    #[test]
    fn test_exact_float_readback() {
        let payload = json!({ "bloom_intensity": 0.42 });
        let reader = SectionReader::new(&payload);
        assert_eq!(reader.number(FieldKey::flat("bloom_intensity")), Some(0.42_f32));
    }
}
