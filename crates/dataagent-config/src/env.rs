//! Environment variable fallback resolution.
//!
//! Two distinct mechanisms, applied at different points in [`crate::loader::load`]:
//! - `apply_env_fallbacks` fills in fields still unset after every file layer
//!   has merged, using the `DATAAGENT_*` map in [`crate::types::env_var_field_map`].
//! - `resolve_env_references` expands `${VAR}` placeholders inside string
//!   values anywhere in the merged tree (e.g. a `connection_string` that
//!   embeds `${DATAAGENT_DATA_DIR}`).

use std::collections::HashMap;

use crate::merge::FieldSources;
use crate::merge::ConfigLayer;
use crate::types::env_var_field_map;

/// Snapshot of the process environment relevant to configuration.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Fill in any dotted field path from [`env_var_field_map`] that is absent
/// from `merged`, recording the layer as [`ConfigLayer::Environment`].
/// Returns the number of fields filled.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied = 0;
    for (var_name, field_path) in env_var_field_map() {
        let Some(raw) = env_vars.get(var_name) else {
            continue;
        };
        if field_is_set(merged, field_path) {
            continue;
        }
        let value = parse_scalar(raw);
        if set_field(merged, field_path, value) {
            sources.insert(field_path.to_string(), ConfigLayer::Environment);
            applied += 1;
        }
    }
    applied
}

/// Expand `${VAR}` placeholders in every string leaf of `value`, using
/// `env_vars`. Unresolvable placeholders are left untouched.
pub fn resolve_env_references(value: &mut toml::Value, env_vars: &HashMap<String, String>) {
    match value {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = expand(s, env_vars);
            }
        },
        toml::Value::Table(table) => {
            for v in table.values_mut() {
                resolve_env_references(v, env_vars);
            }
        },
        toml::Value::Array(items) => {
            for v in items {
                resolve_env_references(v, env_vars);
            }
        },
        _ => {},
    }
}

fn expand(input: &str, env_vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var_name = &rest[start + 2..start + end];
        if let Some(value) = env_vars.get(var_name) {
            out.push_str(value);
        } else {
            out.push_str(&rest[start..start + end + 1]);
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    out
}

fn field_is_set(root: &toml::Value, dotted_path: &str) -> bool {
    lookup(root, dotted_path).is_some()
}

fn lookup<'a>(root: &'a toml::Value, dotted_path: &str) -> Option<&'a toml::Value> {
    let mut current = root;
    for segment in dotted_path.split('.') {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

fn set_field(root: &mut toml::Value, dotted_path: &str, value: toml::Value) -> bool {
    let segments: Vec<&str> = dotted_path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return false;
    };
    let mut current = root;
    for segment in parents {
        if !current.is_table() {
            *current = toml::Value::Table(toml::map::Map::new());
        }
        let table = current.as_table_mut().expect("just ensured table");
        current = table
            .entry((*segment).to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    if !current.is_table() {
        *current = toml::Value::Table(toml::map::Map::new());
    }
    current
        .as_table_mut()
        .expect("just ensured table")
        .insert((*leaf).to_string(), value);
    true
}

fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_fallback_fills_unset_field_only() {
        let mut merged: toml::Value = toml::from_str("[server]\nbind_addr = \"0.0.0.0\"").unwrap();
        let mut sources = FieldSources::new();
        let env_vars = HashMap::from([
            ("DATAAGENT_SERVER_BIND_ADDR".to_string(), "10.0.0.1".to_string()),
            ("DATAAGENT_SERVER_PORT".to_string(), "9090".to_string()),
        ]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env_vars);
        assert_eq!(applied, 1, "bind_addr was already set by the file layer");
        assert_eq!(
            lookup(&merged, "server.bind_addr").unwrap().as_str(),
            Some("0.0.0.0")
        );
        assert_eq!(lookup(&merged, "server.port").unwrap().as_integer(), Some(9090));
    }

    #[test]
    fn reference_expansion_substitutes_known_vars() {
        let mut value = toml::Value::String("prefix-${HOME}-suffix".to_string());
        let env_vars = HashMap::from([("HOME".to_string(), "/root".to_string())]);
        resolve_env_references(&mut value, &env_vars);
        assert_eq!(value.as_str(), Some("prefix-/root-suffix"));
    }

    #[test]
    fn unresolvable_reference_is_left_untouched() {
        let mut value = toml::Value::String("${NOT_SET}".to_string());
        resolve_env_references(&mut value, &HashMap::new());
        assert_eq!(value.as_str(), Some("${NOT_SET}"));
    }
}
