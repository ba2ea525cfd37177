use serde::{Deserialize, Serialize};

use super::components::{
    self, action_link, card, empty_state, format_amount, headline, secondary, separated, title,
    with_caption,
};
use super::{BuiltWidget, fields_of, id_string, invalid, parse_input};
use crate::divkit::{
    Div, DivCommon, DivContainer, DivGallery, DivImage, DivSize, DivText, EdgeInsets, FontWeight,
    HorizontalAlignment, ImageScale, VerticalAlignment,
};
use crate::error::BuildError;
use crate::widget::{BuildRequest, WidgetLayout};

const AVATAR_SIZE: i64 = 44;
const PRODUCT_CARD_WIDTH: i64 = 160;

fn format_temperature(value: f64) -> String {
    let rounded = value.round() as i64;
    if rounded > 0 {
        format!("+{rounded}°")
    } else {
        format!("{rounded}°")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ForecastDay {
    day: String,
    min: f64,
    max: f64,
    condition: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeatherInput {
    city: String,
    temperature: f64,
    condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wind_speed: Option<f64>,
    #[serde(default)]
    forecast: Vec<ForecastDay>,
}

fn forecast_column(day: &ForecastDay) -> Div {
    DivContainer::vertical(vec![
        secondary(&day.day)
            .text_align(HorizontalAlignment::Center)
            .into(),
        DivText::new(&day.condition)
            .font_size(13)
            .color(components::TEXT_PRIMARY)
            .max_lines(1)
            .text_align(HorizontalAlignment::Center)
            .into(),
        DivText::new(format!(
            "{} / {}",
            format_temperature(day.max),
            format_temperature(day.min)
        ))
        .font_size(14)
        .weight(FontWeight::Medium)
        .text_align(HorizontalAlignment::Center)
        .into(),
    ])
    .width(DivSize::MatchParent)
    .into()
}

pub(super) fn weather(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: WeatherInput = parse_input(request)?;

    let mut details = Vec::new();
    if let Some(feels_like) = input.feels_like {
        details.push(format!("Feels like {}", format_temperature(feels_like)));
    }
    if let Some(humidity) = input.humidity {
        details.push(format!("Humidity {}%", humidity.round() as i64));
    }
    if let Some(wind) = input.wind_speed {
        details.push(format!("Wind {wind:.0} m/s"));
    }

    let mut items = vec![
        title(&input.city),
        headline(format_temperature(input.temperature)),
        components::body(&input.condition).into(),
    ];
    if !details.is_empty() {
        items.push(
            secondary(details.join(" · "))
                .margins(EdgeInsets::top(4))
                .into(),
        );
    }
    if !input.forecast.is_empty() {
        items.push(components::divider());
        items.push(
            DivContainer::horizontal(input.forecast.iter().map(forecast_column).collect())
                .width(DivSize::MatchParent)
                .margins(EdgeInsets::top(8))
                .into(),
        );
    }

    Ok(BuiltWidget {
        widget_type: "card",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct Contact {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContactsInput {
    #[serde(default)]
    contacts: Vec<Contact>,
}

/// Up to two uppercase initials, one per word.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

fn avatar(contact: &Contact) -> Div {
    let size = DivSize::Fixed { value: AVATAR_SIZE };
    match contact.avatar_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => DivImage::new(url)
            .scale(ImageScale::Fill)
            .width(size)
            .height(size)
            .corner_radius(AVATAR_SIZE / 2)
            .into(),
        None => DivText::new(initials(&contact.name))
            .font_size(16)
            .bold()
            .color(components::TEXT_ON_ACCENT)
            .text_align(HorizontalAlignment::Center)
            .width(size)
            .height(size)
            .background(components::ACCENT)
            .corner_radius(AVATAR_SIZE / 2)
            .into(),
    }
}

fn contact_row(contact: &Contact) -> Div {
    let mut lines: Vec<Div> = vec![components::body(&contact.name).bold().into()];
    let detail: Vec<&str> = [contact.phone.as_deref(), contact.email.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !detail.is_empty() {
        lines.push(secondary(detail.join(" · ")).into());
    }

    let mut row = DivContainer::horizontal(vec![
        avatar(contact),
        DivContainer::vertical(lines)
            .width(DivSize::MatchParent)
            .margins(EdgeInsets {
                left: Some(12),
                ..EdgeInsets::default()
            })
            .align_vertical(VerticalAlignment::Center)
            .into(),
    ])
    .width(DivSize::MatchParent)
    .paddings(EdgeInsets::symmetric(0, 8));

    if let Some(phone) = contact.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        let dialable: String = phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        row = row.action("contact_call", format!("tel:{dialable}"));
    }
    row.into()
}

pub(super) fn contacts(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: ContactsInput = parse_input(request)?;

    let mut items = vec![title("Contacts")];
    if input.contacts.is_empty() {
        items.push(empty_state("No contacts"));
    } else {
        items.extend(separated(input.contacts.iter().map(contact_row).collect()));
    }

    Ok(BuiltWidget {
        widget_type: "list",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct Product {
    #[serde(deserialize_with = "id_string")]
    id: String,
    title: String,
    price: f64,
    currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProductCarouselInput {
    #[serde(default, alias = "items")]
    products: Vec<Product>,
}

fn product_card(product: &Product) -> Div {
    let mut items: Vec<Div> = Vec::new();
    if let Some(url) = product.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        items.push(
            DivImage::new(url)
                .aspect_ratio(1.0)
                .scale(ImageScale::Fill)
                .width(DivSize::MatchParent)
                .corner_radius(12)
                .margins(EdgeInsets::bottom(8))
                .into(),
        );
    }
    items.push(
        DivText::new(&product.title)
            .font_size(14)
            .color(components::TEXT_PRIMARY)
            .max_lines(2)
            .into(),
    );
    items.push(
        DivText::new(format_amount(product.price, &product.currency))
            .font_size(16)
            .bold()
            .color(components::TEXT_PRIMARY)
            .margins(EdgeInsets::top(4))
            .into(),
    );
    if let Some(rating) = product.rating {
        items.push(secondary(format!("★ {rating:.1}")).into());
    }

    DivContainer::vertical(items)
        .width(DivSize::Fixed {
            value: PRODUCT_CARD_WIDTH,
        })
        .paddings(EdgeInsets::all(8))
        .background(components::SURFACE)
        .corner_radius(12)
        .action(
            "product_open",
            action_link("product/open", &product.id),
        )
        .into()
}

pub(super) fn product_carousel(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: ProductCarouselInput = parse_input(request)?;

    let content: Div = if input.products.is_empty() {
        empty_state("No products")
    } else {
        DivGallery::horizontal(input.products.iter().map(product_card).collect())
            .item_spacing(8)
            .width(DivSize::MatchParent)
            .into()
    };

    Ok(BuiltWidget {
        widget_type: "carousel",
        layout: WidgetLayout::Carousel,
        fields: fields_of(&input),
        div: card(with_caption(request, vec![title("Products"), content])).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderStep {
    title: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderStatusInput {
    #[serde(deserialize_with = "id_string")]
    order_id: String,
    status: String,
    #[serde(default)]
    steps: Vec<OrderStep>,
}

fn step_row(step: &OrderStep) -> Div {
    let (marker, color) = if step.done {
        ("●", components::POSITIVE)
    } else {
        ("○", components::TEXT_SECONDARY)
    };
    DivContainer::horizontal(vec![
        DivText::new(marker)
            .font_size(14)
            .color(color)
            .width(DivSize::Fixed { value: 20 })
            .into(),
        DivText::new(&step.title)
            .font_size(15)
            .color(if step.done {
                components::TEXT_PRIMARY
            } else {
                components::TEXT_SECONDARY
            })
            .width(DivSize::MatchParent)
            .into(),
    ])
    .width(DivSize::MatchParent)
    .paddings(EdgeInsets::symmetric(0, 4))
    .into()
}

pub(super) fn order_status(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: OrderStatusInput = parse_input(request)?;
    if input.order_id.trim().is_empty() {
        return Err(invalid(request, "order_id is empty"));
    }

    let mut items = vec![
        title(format!("Order {}", input.order_id)),
        components::body(&input.status)
            .weight(FontWeight::Medium)
            .color(components::ACCENT)
            .into(),
    ];
    if !input.steps.is_empty() {
        let done = input.steps.iter().filter(|s| s.done).count();
        items.push(
            secondary(format!("{done}/{} steps", input.steps.len()))
                .margins(EdgeInsets::bottom(8))
                .into(),
        );
        items.extend(input.steps.iter().map(step_row));
    }

    Ok(BuiltWidget {
        widget_type: "timeline",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}
