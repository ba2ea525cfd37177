use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::components::{self, card, humanize_key, label, row, separated, title};
use super::{BuiltWidget, fields_of, invalid, parse_input};
use crate::divkit::{Div, DivCommon, DivContainer, DivSize, DivText, EdgeInsets};
use crate::error::BuildError;
use crate::widget::{BuildRequest, WidgetLayout};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Level {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn accent(self) -> &'static str {
        match self {
            Level::Info => components::ACCENT,
            Level::Success => components::POSITIVE,
            Level::Warning => components::WARNING,
            Level::Error => components::NEGATIVE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct NotificationInput {
    title: String,
    message: String,
    #[serde(default)]
    level: Level,
}

/// Banner node; also used to stand in for widgets that failed to build.
pub fn banner(title_text: &str, message: &str, level_name: &str) -> Div {
    let level = match level_name {
        "success" => Level::Success,
        "warning" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    };
    banner_for(title_text, message, level)
}

fn banner_for(title_text: &str, message: &str, level: Level) -> Div {
    DivContainer::vertical(vec![
        DivText::new(title_text)
            .font_size(16)
            .bold()
            .color(components::TEXT_PRIMARY)
            .into(),
        DivText::new(message)
            .font_size(14)
            .color(components::TEXT_PRIMARY)
            .margins(EdgeInsets::top(4))
            .into(),
    ])
    .width(DivSize::MatchParent)
    .paddings(EdgeInsets::all(16))
    .background(components::SURFACE)
    .stroke(level.accent(), 2)
    .corner_radius(16)
    .into()
}

pub(super) fn notification(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: NotificationInput = parse_input(request)?;
    let mut div = banner_for(&input.title, &input.message, input.level);

    if let (Some(caption), Div::Container(container)) = (components::caption(request), &mut div) {
        container.items.insert(0, caption);
    }

    Ok(BuiltWidget {
        widget_type: "banner",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub(super) fn key_value(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let Value::Object(map) = &request.backend_output else {
        return Err(invalid(request, "expected a JSON object"));
    };

    let scalars: Map<String, Value> = map
        .iter()
        .filter(|(_, v)| scalar_text(v).is_some())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let rows: Vec<Div> = scalars
        .iter()
        .filter_map(|(key, value)| {
            scalar_text(value)
                .map(|text| row(label(humanize_key(key), None), text, components::TEXT_PRIMARY))
        })
        .collect();

    let mut items = vec![title("Details")];
    if rows.is_empty() {
        items.push(components::empty_state("Nothing to show"));
    } else {
        items.extend(separated(rows));
    }

    Ok(BuiltWidget {
        widget_type: "table",
        layout: WidgetLayout::Vertical,
        fields: scalars,
        div: card(components::with_caption(request, items)).into(),
    })
}

pub(super) fn text_message(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let Some(text) = request.caption() else {
        return Err(invalid(request, "llm_output is empty"));
    };

    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(|p| p.lines().map(str::trim_end).collect::<Vec<_>>().join("\n"))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let count = paragraphs.len();

    let items: Vec<Div> = paragraphs
        .iter()
        .enumerate()
        .map(|(i, paragraph)| -> Div {
            let node = components::body(paragraph.as_str());
            if i + 1 < count {
                node.margins(EdgeInsets::bottom(8)).into()
            } else {
                node.into()
            }
        })
        .collect();

    let mut fields = Map::new();
    fields.insert("paragraphs".to_string(), Value::from(paragraphs));

    Ok(BuiltWidget {
        widget_type: "text",
        layout: WidgetLayout::Vertical,
        fields,
        div: card(items).into(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notification_level_sets_stroke_color() {
        let request = BuildRequest::new(
            "notification",
            json!({"title": "Limit", "message": "Daily limit reached", "level": "warning"}),
        );
        let built = notification(&request).expect("should build");
        let value = serde_json::to_value(&built.div).expect("serialize");
        assert_eq!(value["border"]["stroke"]["color"], components::WARNING);
        assert_eq!(value["items"][0]["text"], "Limit");
    }

    #[test]
    fn notification_puts_caption_first() {
        let request = BuildRequest::new(
            "notification",
            json!({"title": "Done", "message": "Sent"}),
        )
        .with_llm_output("All set.");
        let built = notification(&request).expect("should build");
        let value = serde_json::to_value(&built.div).expect("serialize");
        assert_eq!(value["items"][0]["text"], "All set.");
        assert_eq!(value["border"]["stroke"]["color"], components::ACCENT);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let request = BuildRequest::new(
            "notification",
            json!({"title": "x", "message": "y", "level": "panic"}),
        );
        assert!(notification(&request).is_err());
    }

    #[test]
    fn key_value_keeps_only_scalars() {
        let request = BuildRequest::new(
            "key_value",
            json!({"account_number": "40817", "active": true, "limits": {"day": 1}, "note": null}),
        );
        let built = key_value(&request).expect("should build");
        assert_eq!(built.fields.len(), 2);
        let text = serde_json::to_value(&built.div).expect("serialize").to_string();
        assert!(text.contains("Account number"));
        assert!(text.contains("\"Yes\""));
        assert!(!text.contains("Limits"));
    }

    #[test]
    fn key_value_rejects_non_objects() {
        let request = BuildRequest::new("key_value", json!([1, 2]));
        assert!(matches!(
            key_value(&request),
            Err(BuildError::InvalidInput { .. })
        ));
    }

    #[test]
    fn text_message_splits_paragraphs() {
        let request = BuildRequest::new("text_message", Value::Null)
            .with_llm_output("First line\nsecond line\n\n\n\nNext paragraph  ");
        let built = text_message(&request).expect("should build");
        assert_eq!(
            built.fields["paragraphs"],
            json!(["First line\nsecond line", "Next paragraph"])
        );
        let value = serde_json::to_value(&built.div).expect("serialize");
        assert_eq!(value["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["items"][0]["margins"]["bottom"], 8);
    }

    #[test]
    fn text_message_requires_llm_output() {
        let request = BuildRequest::new("text_message", Value::Null);
        assert!(text_message(&request).is_err());
    }
}
