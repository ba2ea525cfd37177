use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a widget arranges its content on the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WidgetLayout {
    #[default]
    Vertical,
    Horizontal,
    Grid,
    Carousel,
}

/// Descriptor of one rendered widget.
///
/// `fields` carries the data the builder consumed so clients that render
/// natively do not have to parse the DivKit tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Widget {
    /// Display name: the builder function (e.g. "balance") unless a stored config overrides it
    pub name: String,
    /// Widget kind (e.g. "card", "list", "carousel")
    #[serde(rename = "type")]
    pub widget_type: String,
    /// Position among sibling widgets, ascending
    pub order: i32,
    pub layout: WidgetLayout,
    #[schema(value_type = Object)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Result of running one builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BuildOutput {
    pub widget: Widget,
    /// Serialized DivKit card, absent when the caller only wants the descriptor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<serde_json::Value>,
}

/// Input to a builder: the function to run plus the chat and tool outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BuildRequest {
    /// Registered builder name (see GET /chat/v3/functions)
    pub function_name: String,
    /// Free text produced by the LLM for this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<String>,
    /// Raw tool payload; its expected shape depends on `function_name`
    #[serde(default)]
    pub backend_output: serde_json::Value,
}

impl BuildRequest {
    pub fn new(function_name: impl Into<String>, backend_output: serde_json::Value) -> Self {
        Self {
            function_name: function_name.into(),
            llm_output: None,
            backend_output,
        }
    }

    pub fn with_llm_output(mut self, llm_output: impl Into<String>) -> Self {
        self.llm_output = Some(llm_output.into());
        self
    }

    /// LLM text trimmed, or `None` when blank.
    pub fn caption(&self) -> Option<&str> {
        self.llm_output
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
