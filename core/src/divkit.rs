//! Typed subset of the DivKit layout schema.
//!
//! Nodes serialize to the JSON a DivKit client expects. Unset properties are
//! omitted so the renderer applies its own defaults.

use serde::{Deserialize, Serialize};

/// A single DivKit node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Div {
    Container(DivContainer),
    Text(DivText),
    Image(DivImage),
    Separator(DivSeparator),
    Gallery(DivGallery),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DivSize {
    Fixed { value: i64 },
    MatchParent,
    WrapContent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
}

impl EdgeInsets {
    pub fn all(value: i64) -> Self {
        Self {
            left: Some(value),
            top: Some(value),
            right: Some(value),
            bottom: Some(value),
        }
    }

    pub fn symmetric(horizontal: i64, vertical: i64) -> Self {
        Self {
            left: Some(horizontal),
            top: Some(vertical),
            right: Some(horizontal),
            bottom: Some(vertical),
        }
    }

    pub fn top(value: i64) -> Self {
        Self {
            top: Some(value),
            ..Self::default()
        }
    }

    pub fn bottom(value: i64) -> Self {
        Self {
            bottom: Some(value),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Solid { color: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Border {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
}

/// Tap handler. `url` is usually a `div-action://` deep link handled by the host app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub log_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

/// Properties shared by every node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<DivSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<DivSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paddings: Option<EdgeInsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<EdgeInsets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Vec<Background>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_horizontal: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_vertical: Option<VerticalAlignment>,
}

/// Setters for the common properties, available on every node builder.
pub trait DivCommon: Sized {
    fn base_mut(&mut self) -> &mut DivBase;

    fn id(mut self, id: impl Into<String>) -> Self {
        self.base_mut().id = Some(id.into());
        self
    }

    fn width(mut self, size: DivSize) -> Self {
        self.base_mut().width = Some(size);
        self
    }

    fn height(mut self, size: DivSize) -> Self {
        self.base_mut().height = Some(size);
        self
    }

    fn paddings(mut self, insets: EdgeInsets) -> Self {
        self.base_mut().paddings = Some(insets);
        self
    }

    fn margins(mut self, insets: EdgeInsets) -> Self {
        self.base_mut().margins = Some(insets);
        self
    }

    fn background(mut self, color: impl Into<String>) -> Self {
        self.base_mut().background = Some(vec![Background::Solid {
            color: color.into(),
        }]);
        self
    }

    fn corner_radius(mut self, radius: i64) -> Self {
        self.base_mut()
            .border
            .get_or_insert_with(Border::default)
            .corner_radius = Some(radius);
        self
    }

    fn stroke(mut self, color: impl Into<String>, width: i64) -> Self {
        self.base_mut()
            .border
            .get_or_insert_with(Border::default)
            .stroke = Some(Stroke {
            color: color.into(),
            width,
        });
        self
    }

    fn action(mut self, log_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.base_mut().action = Some(Action {
            log_id: log_id.into(),
            url: url.into(),
        });
        self
    }

    fn align_horizontal(mut self, alignment: HorizontalAlignment) -> Self {
        self.base_mut().alignment_horizontal = Some(alignment);
        self
    }

    fn align_vertical(mut self, alignment: VerticalAlignment) -> Self {
        self.base_mut().alignment_vertical = Some(alignment);
        self
    }
}

macro_rules! impl_div_common {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl DivCommon for $node {
                fn base_mut(&mut self) -> &mut DivBase {
                    &mut self.base
                }
            }

            impl From<$node> for Div {
                fn from(node: $node) -> Self {
                    Div::$variant(node)
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
    Overlap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivContainer {
    #[serde(flatten)]
    pub base: DivBase,
    pub orientation: Orientation,
    pub items: Vec<Div>,
}

impl DivContainer {
    pub fn vertical(items: Vec<Div>) -> Self {
        Self {
            base: DivBase::default(),
            orientation: Orientation::Vertical,
            items,
        }
    }

    pub fn horizontal(items: Vec<Div>) -> Self {
        Self {
            base: DivBase::default(),
            orientation: Orientation::Horizontal,
            items,
        }
    }

    pub fn overlap(items: Vec<Div>) -> Self {
        Self {
            base: DivBase::default(),
            orientation: Orientation::Overlap,
            items,
        }
    }

    pub fn push(&mut self, item: impl Into<Div>) {
        self.items.push(item.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Light,
    Regular,
    Medium,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivText {
    #[serde(flatten)]
    pub base: DivBase,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_alignment_horizontal: Option<HorizontalAlignment>,
}

impl DivText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: DivBase::default(),
            text: text.into(),
            font_size: None,
            font_weight: None,
            text_color: None,
            max_lines: None,
            text_alignment_horizontal: None,
        }
    }

    pub fn font_size(mut self, size: i64) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn weight(mut self, weight: FontWeight) -> Self {
        self.font_weight = Some(weight);
        self
    }

    pub fn bold(self) -> Self {
        self.weight(FontWeight::Bold)
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.text_color = Some(color.into());
        self
    }

    pub fn max_lines(mut self, lines: i64) -> Self {
        self.max_lines = Some(lines);
        self
    }

    pub fn text_align(mut self, alignment: HorizontalAlignment) -> Self {
        self.text_alignment_horizontal = Some(alignment);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub aspect_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageScale {
    Fill,
    Fit,
    NoScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivImage {
    #[serde(flatten)]
    pub base: DivBase,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<Aspect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ImageScale>,
}

impl DivImage {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            base: DivBase::default(),
            image_url: image_url.into(),
            aspect: None,
            scale: None,
        }
    }

    pub fn aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect = Some(Aspect {
            aspect_ratio: ratio,
        });
        self
    }

    pub fn scale(mut self, scale: ImageScale) -> Self {
        self.scale = Some(scale);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimiterStyle {
    pub color: String,
    pub orientation: SeparatorOrientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorOrientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivSeparator {
    #[serde(flatten)]
    pub base: DivBase,
    pub delimiter_style: DelimiterStyle,
}

impl DivSeparator {
    pub fn horizontal(color: impl Into<String>) -> Self {
        Self {
            base: DivBase::default(),
            delimiter_style: DelimiterStyle {
                color: color.into(),
                orientation: SeparatorOrientation::Horizontal,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivGallery {
    #[serde(flatten)]
    pub base: DivBase,
    pub items: Vec<Div>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_spacing: Option<i64>,
    pub orientation: Orientation,
}

impl DivGallery {
    pub fn horizontal(items: Vec<Div>) -> Self {
        Self {
            base: DivBase::default(),
            items,
            item_spacing: None,
            orientation: Orientation::Horizontal,
        }
    }

    pub fn item_spacing(mut self, spacing: i64) -> Self {
        self.item_spacing = Some(spacing);
        self
    }
}

impl_div_common!(
    DivContainer => Container,
    DivText => Text,
    DivImage => Image,
    DivSeparator => Separator,
    DivGallery => Gallery,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivState {
    pub state_id: i64,
    pub div: Div,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardBody {
    pub log_id: String,
    pub states: Vec<DivState>,
}

/// Top-level DivKit document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivCard {
    pub card: CardBody,
    pub templates: serde_json::Map<String, serde_json::Value>,
}

impl DivCard {
    pub fn to_value(&self) -> serde_json::Value {
        // Every field is a plain string/number/map; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Wrap a root node into a single-state card.
pub fn make_div(log_id: impl Into<String>, div: impl Into<Div>) -> DivCard {
    DivCard {
        card: CardBody {
            log_id: log_id.into(),
            states: vec![DivState {
                state_id: 0,
                div: div.into(),
            }],
        },
        templates: serde_json::Map::new(),
    }
}

/// Wrap an already-serialized root node into a single-state card.
///
/// Used for template plugins whose trees may use DivKit features outside the
/// typed model.
pub fn raw_card(log_id: impl Into<String>, div: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "card": {
            "log_id": log_id.into(),
            "states": [{ "state_id": 0, "div": div }],
        },
        "templates": {},
    })
}
