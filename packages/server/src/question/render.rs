use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use super::info::ParameterRange;

/// Draw every parameter from its range. The same seed always yields the
/// same parameters.
pub fn generate_params(seed: u64, parameters: &BTreeMap<String, ParameterRange>) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut params = Map::new();
    for (name, range) in parameters {
        let (lo, hi) = if range.min <= range.max {
            (range.min, range.max)
        } else {
            (range.max, range.min)
        };
        params.insert(name.clone(), Value::from(rng.random_range(lo..=hi)));
    }
    Value::Object(params)
}

/// Replace `{{params.NAME}}` placeholders with the variant's parameter
/// values. Unknown placeholders render as empty strings.
pub fn render_template(template: &str, params: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after[..end].trim();
        if let Some(name) = key.strip_prefix("params.") {
            match params.get(name) {
                Some(Value::String(s)) => out.push_str(s),
                Some(Value::Null) | None => {}
                Some(other) => out.push_str(&other.to_string()),
            }
        } else {
            out.push_str(&rest[start..start + 2 + end + 2]);
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
