//! Template plugins: builders declared as JSON manifests instead of code.
//!
//! A manifest names the function, describes the widget, and carries a DivKit
//! tree with `${path}` placeholders that are filled from the payload at build
//! time. Plugins are loaded once at startup from a directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BuildError;
use crate::widget::{BuildRequest, WidgetLayout};

static PLUGIN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,63}$").expect("plugin name regex is valid"));

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\}").expect("placeholder regex is valid")
});

/// Reserved placeholder that resolves to the LLM text.
pub const LLM_OUTPUT_PLACEHOLDER: &str = "llm_output";

fn default_widget_type() -> String {
    "custom".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePlugin {
    pub name: String,
    #[serde(default = "default_widget_type")]
    pub widget_type: String,
    #[serde(default)]
    pub layout: WidgetLayout,
    /// Payload paths that must resolve, otherwise the build fails
    #[serde(default)]
    pub required_fields: Vec<String>,
    pub template: Value,
}

/// Outcome of scanning a plugin directory.
#[derive(Debug, Default)]
pub struct PluginLoad {
    pub plugins: Vec<TemplatePlugin>,
    pub rejected: Vec<(PathBuf, String)>,
}

impl TemplatePlugin {
    pub fn validate(&self) -> Result<(), String> {
        if !PLUGIN_NAME.is_match(&self.name) {
            return Err(format!(
                "name '{}' must match {}",
                self.name,
                PLUGIN_NAME.as_str()
            ));
        }
        match self.template.get("type") {
            Some(Value::String(_)) => Ok(()),
            _ => Err("template must be an object with a string 'type'".to_string()),
        }
    }

    pub fn render(&self, request: &BuildRequest) -> Result<Value, BuildError> {
        let missing: Vec<&str> = self
            .required_fields
            .iter()
            .map(String::as_str)
            .filter(|path| resolve(request, path).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::InvalidInput {
                function: self.name.clone(),
                reason: format!("missing required fields: {}", missing.join(", ")),
            });
        }
        Ok(substitute(&self.template, request))
    }
}

/// Look up a dotted path in the payload; `llm_output` is reserved.
fn resolve(request: &BuildRequest, path: &str) -> Option<Value> {
    if path == LLM_OUTPUT_PLACEHOLDER {
        return request.llm_output.clone().map(Value::String);
    }
    let mut current = &request.backend_output;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current.clone())
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn substitute(template: &Value, request: &BuildRequest) -> Value {
    match template {
        Value::String(text) => {
            if let Some(caps) = PLACEHOLDER.captures(text) {
                if caps.get(0).map(|m| m.as_str().len()) == Some(text.len()) {
                    return resolve(request, &caps[1])
                        .unwrap_or_else(|| Value::String(String::new()));
                }
            }
            let replaced = PLACEHOLDER.replace_all(text, |caps: &regex::Captures<'_>| {
                resolve(request, &caps[1])
                    .map(|v| as_text(&v))
                    .unwrap_or_default()
            });
            Value::String(replaced.into_owned())
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, request)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, request)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Read every `*.json` manifest in `dir`, sorted by file name.
///
/// A missing directory is an empty load. Broken manifests are collected in
/// `rejected` and never abort the scan.
pub fn load_dir(dir: &Path) -> PluginLoad {
    let mut load = PluginLoad::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "plugin directory does not exist");
            return load;
        }
        Err(e) => {
            load.rejected.push((dir.to_path_buf(), e.to_string()));
            return load;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json") && path.is_file())
        .collect();
    paths.sort();

    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<TemplatePlugin>(&raw).map_err(|e| e.to_string())
            })
            .and_then(|plugin| plugin.validate().map(|_| plugin));

        match parsed {
            Ok(plugin) => {
                tracing::info!(plugin = %plugin.name, path = %path.display(), "loaded template plugin");
                load.plugins.push(plugin);
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), reason = %reason, "rejected template plugin");
                load.rejected.push((path, reason));
            }
        }
    }

    load
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn plugin(template: Value, required: &[&str]) -> TemplatePlugin {
        TemplatePlugin {
            name: "loyalty".to_string(),
            widget_type: "badge".to_string(),
            layout: WidgetLayout::Horizontal,
            required_fields: required.iter().map(|s| s.to_string()).collect(),
            template,
        }
    }

    #[test]
    fn whole_placeholder_keeps_json_type() {
        let p = plugin(json!({"type": "text", "font_size": "${size}"}), &[]);
        let out = p
            .render(&BuildRequest::new("loyalty", json!({"size": 18})))
            .expect("render should succeed");
        assert_eq!(out["font_size"], 18);
    }

    #[test]
    fn embedded_placeholders_interpolate_nested_paths() {
        let p = plugin(
            json!({"type": "text", "text": "${user.name}: ${points} pts (${llm_output})"}),
            &[],
        );
        let request = BuildRequest::new("loyalty", json!({"user": {"name": "Ira"}, "points": 40}))
            .with_llm_output("nice");
        let out = p.render(&request).expect("render should succeed");
        assert_eq!(out["text"], "Ira: 40 pts (nice)");
    }

    #[test]
    fn missing_optional_path_renders_empty() {
        let p = plugin(json!({"type": "text", "text": "[${absent}]", "x": "${absent}"}), &[]);
        let out = p
            .render(&BuildRequest::new("loyalty", json!({})))
            .expect("render should succeed");
        assert_eq!(out["text"], "[]");
        assert_eq!(out["x"], "");
    }

    #[test]
    fn array_index_segments_resolve() {
        let p = plugin(json!({"type": "text", "text": "${items.1.title}"}), &[]);
        let out = p
            .render(&BuildRequest::new(
                "loyalty",
                json!({"items": [{"title": "a"}, {"title": "b"}]}),
            ))
            .expect("render should succeed");
        assert_eq!(out["text"], "b");
    }

    #[test]
    fn missing_required_field_fails() {
        let p = plugin(json!({"type": "text", "text": "${points}"}), &["points", "tier"]);
        let err = p
            .render(&BuildRequest::new("loyalty", json!({"points": null})))
            .expect_err("missing fields must fail");
        assert!(err.to_string().contains("points, tier"));
    }

    #[test]
    fn validate_rejects_bad_names_and_templates() {
        let mut p = plugin(json!({"type": "text"}), &[]);
        assert!(p.validate().is_ok());
        p.name = "Bad-Name".to_string();
        assert!(p.validate().is_err());
        let p = plugin(json!(["not", "an", "object"]), &[]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn load_dir_keeps_good_manifests_and_reports_bad_ones() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path();
        std::fs::write(
            dir.join("a_good.json"),
            r#"{"name": "good_one", "template": {"type": "text", "text": "${x}"}}"#,
        )
        .expect("write good");
        std::fs::write(dir.join("b_broken.json"), "{ nope").expect("write broken");
        std::fs::write(
            dir.join("c_invalid.json"),
            r#"{"name": "Invalid Name", "template": {"type": "text"}}"#,
        )
        .expect("write invalid");
        std::fs::write(dir.join("ignored.txt"), "not a manifest").expect("write txt");

        let load = load_dir(dir);
        assert_eq!(load.plugins.len(), 1);
        assert_eq!(load.plugins[0].name, "good_one");
        assert_eq!(load.plugins[0].widget_type, "custom");
        assert_eq!(load.rejected.len(), 2);
    }

    #[test]
    fn load_dir_of_missing_directory_is_empty() {
        let load = load_dir(Path::new("/definitely/not/here/divbridge"));
        assert!(load.plugins.is_empty());
        assert!(load.rejected.is_empty());
    }
}
