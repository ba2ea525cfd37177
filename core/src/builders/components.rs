//! Shared building blocks: palette, typography and the few layouts every
//! builder repeats (card shell, label/value row, caption, empty state).

use crate::divkit::{
    Div, DivCommon, DivContainer, DivSeparator, DivSize, DivText, EdgeInsets, FontWeight,
    HorizontalAlignment, VerticalAlignment,
};
use crate::widget::BuildRequest;

pub const TEXT_PRIMARY: &str = "#1A1A1A";
pub const TEXT_SECONDARY: &str = "#8A8A8E";
pub const TEXT_ON_ACCENT: &str = "#FFFFFF";
pub const POSITIVE: &str = "#21A038";
pub const NEGATIVE: &str = "#E5484D";
pub const WARNING: &str = "#F5A623";
pub const ACCENT: &str = "#3D7BF7";
pub const CARD_BACKGROUND: &str = "#FFFFFF";
pub const SURFACE: &str = "#F2F3F5";
pub const DIVIDER: &str = "#E4E5E8";

pub const SCREEN_PADDING: i64 = 12;
pub const SCREEN_GAP: i64 = 12;
const CARD_PADDING: i64 = 16;
const CARD_RADIUS: i64 = 16;

/// `1234.5, "RUB"` -> `"1 234.50 RUB"`. Rounds half away from zero to cents.
///
/// Works on the decimal digits of the rounded cent value, so amounts past
/// the integer range keep every digit.
pub fn format_amount(amount: f64, currency: &str) -> String {
    let currency = currency.trim();
    if !amount.is_finite() {
        return format!("{amount} {currency}").trim_end().to_string();
    }

    // `round` yields an integral float, so `{:.0}` prints it exactly.
    let cents = (amount.abs() * 100.0).round();
    let digits = format!("{cents:0>3.0}");
    let (whole, fraction) = digits.split_at(digits.len() - 2);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0.0 { "-" } else { "" };
    if currency.is_empty() {
        format!("{sign}{grouped}.{fraction}")
    } else {
        format!("{sign}{grouped}.{fraction} {currency}")
    }
}

/// Same as `format_amount` but positive values carry an explicit `+`.
pub fn format_signed_amount(amount: f64, currency: &str) -> String {
    let formatted = format_amount(amount, currency);
    if amount > 0.0 && (amount * 100.0).round() > 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

pub fn amount_color(amount: f64) -> &'static str {
    if amount < 0.0 { NEGATIVE } else { POSITIVE }
}

/// Card shell: full width, rounded, padded.
pub fn card(items: Vec<Div>) -> DivContainer {
    DivContainer::vertical(items)
        .width(DivSize::MatchParent)
        .paddings(EdgeInsets::all(CARD_PADDING))
        .background(CARD_BACKGROUND)
        .corner_radius(CARD_RADIUS)
}

pub fn title(text: impl Into<String>) -> Div {
    DivText::new(text)
        .font_size(18)
        .bold()
        .color(TEXT_PRIMARY)
        .margins(EdgeInsets::bottom(8))
        .into()
}

pub fn headline(text: impl Into<String>) -> Div {
    DivText::new(text)
        .font_size(28)
        .bold()
        .color(TEXT_PRIMARY)
        .into()
}

pub fn body(text: impl Into<String>) -> DivText {
    DivText::new(text).font_size(15).color(TEXT_PRIMARY)
}

pub fn secondary(text: impl Into<String>) -> DivText {
    DivText::new(text).font_size(13).color(TEXT_SECONDARY)
}

/// The LLM text rendered above a widget, when there is any.
pub fn caption(request: &BuildRequest) -> Option<Div> {
    request.caption().map(|text| {
        DivText::new(text)
            .font_size(14)
            .color(TEXT_PRIMARY)
            .margins(EdgeInsets::bottom(12))
            .into()
    })
}

/// Builder content preceded by the caption block.
pub fn with_caption(request: &BuildRequest, items: Vec<Div>) -> Vec<Div> {
    let mut out = Vec::with_capacity(items.len() + 1);
    out.extend(caption(request));
    out.extend(items);
    out
}

/// Label on the left, value on the right.
pub fn row(label: Div, value: impl Into<String>, value_color: &str) -> Div {
    DivContainer::horizontal(vec![
        label,
        DivText::new(value)
            .font_size(15)
            .weight(FontWeight::Medium)
            .color(value_color)
            .width(DivSize::WrapContent)
            .align_vertical(VerticalAlignment::Center)
            .into(),
    ])
    .width(DivSize::MatchParent)
    .paddings(EdgeInsets::symmetric(0, 8))
    .into()
}

/// Label with an optional secondary line underneath.
pub fn label(primary: impl Into<String>, detail: Option<String>) -> Div {
    let mut items: Vec<Div> = vec![body(primary).into()];
    if let Some(detail) = detail.filter(|d| !d.trim().is_empty()) {
        items.push(secondary(detail).into());
    }
    DivContainer::vertical(items)
        .width(DivSize::MatchParent)
        .into()
}

pub fn divider() -> Div {
    DivSeparator::horizontal(DIVIDER)
        .width(DivSize::MatchParent)
        .margins(EdgeInsets::symmetric(0, 4))
        .into()
}

/// Interleave rows with dividers.
pub fn separated(rows: Vec<Div>) -> Vec<Div> {
    let mut out = Vec::with_capacity(rows.len() * 2);
    for (i, row) in rows.into_iter().enumerate() {
        if i > 0 {
            out.push(divider());
        }
        out.push(row);
    }
    out
}

pub fn empty_state(text: impl Into<String>) -> Div {
    secondary(text)
        .text_align(HorizontalAlignment::Center)
        .width(DivSize::MatchParent)
        .paddings(EdgeInsets::symmetric(0, 16))
        .into()
}

pub fn button(text: impl Into<String>, log_id: &str, url: String, primary: bool) -> Div {
    let (background, color) = if primary {
        (ACCENT, TEXT_ON_ACCENT)
    } else {
        (SURFACE, TEXT_PRIMARY)
    };
    DivText::new(text)
        .font_size(16)
        .weight(FontWeight::Medium)
        .color(color)
        .text_align(HorizontalAlignment::Center)
        .width(DivSize::MatchParent)
        .paddings(EdgeInsets::symmetric(12, 12))
        .background(background)
        .corner_radius(12)
        .action(log_id, url)
        .into()
}

/// `div-action://{route}?id=...` with the id form-encoded.
pub fn action_link(route: &str, id: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id", id)
        .finish();
    format!("div-action://{route}?{query}")
}

/// `"snake_case_key"` -> `"Snake case key"`.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
