//! Widget builders and the registry that dispatches on `function_name`.

mod components;
mod finance;
mod generic;
mod lifestyle;

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::divkit::{Div, DivCommon, DivContainer, DivSize, EdgeInsets, make_div, raw_card};
use crate::error::BuildError;
use crate::plugins::TemplatePlugin;
use crate::widget::{BuildOutput, BuildRequest, Widget, WidgetLayout};

pub use components::format_amount;
pub use generic::banner;

/// What a builtin hands back to the registry.
#[derive(Debug, Clone)]
pub struct BuiltWidget {
    pub widget_type: &'static str,
    pub layout: WidgetLayout,
    pub fields: Map<String, Value>,
    pub div: Div,
}

pub type BuilderFn = fn(&BuildRequest) -> Result<BuiltWidget, BuildError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FunctionSource {
    Builtin,
    Plugin,
}

/// Catalog entry for GET /chat/v3/functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FunctionInfo {
    pub name: String,
    pub source: FunctionSource,
    pub widget_type: String,
}

struct Builtin {
    widget_type: &'static str,
    build: BuilderFn,
}

const BUILTINS: &[(&str, &str, BuilderFn)] = &[
    ("balance", "card", finance::balance),
    ("transactions", "list", finance::transactions),
    ("currency_rates", "table", finance::currency_rates),
    ("payment_approval", "form", finance::payment_approval),
    ("weather", "card", lifestyle::weather),
    ("contacts", "list", lifestyle::contacts),
    ("product_carousel", "carousel", lifestyle::product_carousel),
    ("order_status", "timeline", lifestyle::order_status),
    ("notification", "banner", generic::notification),
    ("key_value", "table", generic::key_value),
    ("text_message", "text", generic::text_message),
];

pub struct BuilderRegistry {
    builtins: BTreeMap<&'static str, Builtin>,
    plugins: BTreeMap<String, TemplatePlugin>,
}

impl BuilderRegistry {
    pub fn with_builtins() -> Self {
        let builtins = BUILTINS
            .iter()
            .map(|(name, widget_type, build)| {
                (
                    *name,
                    Builtin {
                        widget_type: *widget_type,
                        build: *build,
                    },
                )
            })
            .collect();
        Self {
            builtins,
            plugins: BTreeMap::new(),
        }
    }

    /// Add a template plugin. Names already taken by a builtin or another
    /// plugin are rejected.
    pub fn register_plugin(&mut self, plugin: TemplatePlugin) -> Result<(), BuildError> {
        if self.contains(&plugin.name) {
            return Err(BuildError::DuplicateFunction(plugin.name));
        }
        self.plugins.insert(plugin.name.clone(), plugin);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name) || self.plugins.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.builtins.len() + self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builtins first, then plugins, each sorted by name.
    pub fn functions(&self) -> Vec<FunctionInfo> {
        let builtins = self.builtins.iter().map(|(name, b)| FunctionInfo {
            name: (*name).to_string(),
            source: FunctionSource::Builtin,
            widget_type: b.widget_type.to_string(),
        });
        let plugins = self.plugins.values().map(|p| FunctionInfo {
            name: p.name.clone(),
            source: FunctionSource::Plugin,
            widget_type: p.widget_type.clone(),
        });
        builtins.chain(plugins).collect()
    }

    pub fn build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
        let name = request.function_name.as_str();

        if let Some(builtin) = self.builtins.get(name) {
            let built = (builtin.build)(request)?;
            let card = make_div(name, built.div);
            return Ok(BuildOutput {
                widget: Widget {
                    name: name.to_string(),
                    widget_type: built.widget_type.to_string(),
                    order: 0,
                    layout: built.layout,
                    fields: built.fields,
                },
                ui: Some(card.to_value()),
            });
        }

        if let Some(plugin) = self.plugins.get(name) {
            let root = plugin.render(request)?;
            let fields = match &request.backend_output {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            return Ok(BuildOutput {
                widget: Widget {
                    name: name.to_string(),
                    widget_type: plugin.widget_type.clone(),
                    order: 0,
                    layout: plugin.layout,
                    fields,
                },
                ui: Some(raw_card(name, root)),
            });
        }

        Err(BuildError::UnknownFunction(name.to_string()))
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Stack the root nodes of several cards into one vertical screen card.
///
/// Cards without a root node are skipped.
pub fn compose_screen(log_id: &str, cards: &[Value]) -> Value {
    let roots: Vec<Value> = cards
        .iter()
        .filter_map(|card| card.pointer("/card/states/0/div").cloned())
        .collect();
    let count = roots.len();

    let mut screen = match serde_json::to_value(Div::from(
        DivContainer::vertical(Vec::new())
            .width(DivSize::MatchParent)
            .paddings(EdgeInsets::all(components::SCREEN_PADDING)),
    )) {
        Ok(value) => value,
        Err(_) => Value::Null,
    };

    let items = roots
        .into_iter()
        .enumerate()
        .map(|(index, mut root)| {
            if index + 1 < count {
                if let Value::Object(map) = &mut root {
                    map.entry("margins")
                        .or_insert_with(|| serde_json::json!({ "bottom": components::SCREEN_GAP }));
                }
            }
            root
        })
        .collect();
    screen["items"] = Value::Array(items);

    raw_card(log_id, screen)
}

/// Deserialize the builder's typed input from the payload.
pub(crate) fn parse_input<T: DeserializeOwned>(request: &BuildRequest) -> Result<T, BuildError> {
    serde_json::from_value(request.backend_output.clone()).map_err(|e| BuildError::InvalidInput {
        function: request.function_name.clone(),
        reason: e.to_string(),
    })
}

/// The normalized input as reported back in `Widget::fields`.
pub(crate) fn fields_of<T: Serialize>(input: &T) -> Map<String, Value> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Identifier that backends send either as a JSON string or a number.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

pub(crate) fn invalid(request: &BuildRequest, reason: impl Into<String>) -> BuildError {
    BuildError::InvalidInput {
        function: request.function_name.clone(),
        reason: reason.into(),
    }
}
