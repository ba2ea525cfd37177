use serde::{Deserialize, Serialize};

use super::components::{
    self, amount_color, button, card, empty_state, format_amount, format_signed_amount, headline,
    label, row, secondary, separated, title, with_caption,
};
use super::{BuiltWidget, fields_of, id_string, invalid, parse_input};
use crate::divkit::{
    Div, DivCommon, DivContainer, DivSize, DivText, EdgeInsets, FontWeight,
};
use crate::error::BuildError;
use crate::widget::{BuildRequest, WidgetLayout};

#[derive(Debug, Serialize, Deserialize)]
struct Money {
    amount: f64,
    currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Account {
    name: String,
    amount: f64,
    currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BalanceInput {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total: Option<Money>,
}

/// Last four characters of an account number, prefixed with a mask.
fn mask_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("•• {tail}")
}

pub(super) fn balance(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: BalanceInput = parse_input(request)?;

    let mut items = vec![title("Balance")];
    if let Some(total) = &input.total {
        items.push(headline(format_amount(total.amount, &total.currency)));
        items.push(
            components::secondary("Total across accounts")
                .margins(EdgeInsets::bottom(8))
                .into(),
        );
    }

    if input.accounts.is_empty() {
        items.push(empty_state("No accounts"));
    } else {
        let rows = input
            .accounts
            .iter()
            .map(|account| {
                row(
                    label(&account.name, account.number.as_deref().map(mask_number)),
                    format_amount(account.amount, &account.currency),
                    if account.amount < 0.0 {
                        components::NEGATIVE
                    } else {
                        components::TEXT_PRIMARY
                    },
                )
            })
            .collect();
        items.extend(separated(rows));
    }

    Ok(BuiltWidget {
        widget_type: "card",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct Transaction {
    date: String,
    description: String,
    amount: f64,
    currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransactionsInput {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

pub(super) fn transactions(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: TransactionsInput = parse_input(request)?;

    let mut items = vec![title("Transactions")];
    if input.transactions.is_empty() {
        items.push(empty_state("No transactions"));
    } else {
        let rows = input
            .transactions
            .iter()
            .map(|tx| {
                row(
                    label(&tx.description, Some(tx.date.clone())),
                    format_signed_amount(tx.amount, &tx.currency),
                    amount_color(tx.amount),
                )
            })
            .collect();
        items.extend(separated(rows));
    }

    Ok(BuiltWidget {
        widget_type: "list",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct Rate {
    currency: String,
    buy: f64,
    sell: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CurrencyRatesInput {
    base: String,
    #[serde(default)]
    rates: Vec<Rate>,
}

fn rate_cell(text: impl Into<String>, weight: FontWeight, color: &str) -> Div {
    DivText::new(text)
        .font_size(15)
        .weight(weight)
        .color(color)
        .width(DivSize::MatchParent)
        .into()
}

fn rate_row(cells: [(String, FontWeight, &str); 3]) -> Div {
    DivContainer::horizontal(
        cells
            .into_iter()
            .map(|(text, weight, color)| rate_cell(text, weight, color))
            .collect(),
    )
    .width(DivSize::MatchParent)
    .paddings(EdgeInsets::symmetric(0, 6))
    .into()
}

pub(super) fn currency_rates(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: CurrencyRatesInput = parse_input(request)?;
    if input.base.trim().is_empty() {
        return Err(invalid(request, "base currency is empty"));
    }

    let mut items = vec![title(format!("Exchange rates · {}", input.base))];
    if input.rates.is_empty() {
        items.push(empty_state("No rates"));
    } else {
        items.push(rate_row([
            ("Currency".to_string(), FontWeight::Regular, components::TEXT_SECONDARY),
            ("Buy".to_string(), FontWeight::Regular, components::TEXT_SECONDARY),
            ("Sell".to_string(), FontWeight::Regular, components::TEXT_SECONDARY),
        ]));
        items.push(components::divider());
        for rate in &input.rates {
            items.push(rate_row([
                (rate.currency.clone(), FontWeight::Medium, components::TEXT_PRIMARY),
                (format!("{:.2}", rate.buy), FontWeight::Regular, components::TEXT_PRIMARY),
                (format!("{:.2}", rate.sell), FontWeight::Regular, components::TEXT_PRIMARY),
            ]));
        }
    }

    Ok(BuiltWidget {
        widget_type: "table",
        layout: WidgetLayout::Grid,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentApprovalInput {
    #[serde(deserialize_with = "id_string")]
    payment_id: String,
    recipient: String,
    amount: f64,
    currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fee: Option<f64>,
}

pub(super) fn payment_approval(request: &BuildRequest) -> Result<BuiltWidget, BuildError> {
    let input: PaymentApprovalInput = parse_input(request)?;
    if input.payment_id.trim().is_empty() {
        return Err(invalid(request, "payment_id is empty"));
    }
    if input.amount.is_nan() || input.amount <= 0.0 {
        return Err(invalid(request, "amount must be positive"));
    }

    let mut details = vec![row(
        secondary("Recipient").width(DivSize::MatchParent).into(),
        input.recipient.clone(),
        components::TEXT_PRIMARY,
    )];
    if let Some(from) = &input.account_from {
        details.push(row(
            secondary("From").width(DivSize::MatchParent).into(),
            from.clone(),
            components::TEXT_PRIMARY,
        ));
    }
    if let Some(fee) = input.fee {
        details.push(row(
            secondary("Fee").width(DivSize::MatchParent).into(),
            format_amount(fee, &input.currency),
            components::TEXT_PRIMARY,
        ));
    }
    if let Some(description) = input.description.as_deref().filter(|d| !d.trim().is_empty()) {
        details.push(row(
            secondary("Purpose").width(DivSize::MatchParent).into(),
            description.to_string(),
            components::TEXT_PRIMARY,
        ));
    }

    let buttons: Div = DivContainer::horizontal(vec![
        button(
            "Reject",
            "payment_reject",
            components::action_link("payment/reject", &input.payment_id),
            false,
        ),
        DivContainer::vertical(Vec::new())
            .width(DivSize::Fixed { value: 8 })
            .into(),
        button(
            "Approve",
            "payment_approve",
            components::action_link("payment/approve", &input.payment_id),
            true,
        ),
    ])
    .width(DivSize::MatchParent)
    .margins(EdgeInsets::top(16))
    .into();

    let mut items = vec![
        title("Confirm payment"),
        headline(format_amount(input.amount, &input.currency)),
    ];
    items.extend(separated(details));
    items.push(buttons);

    Ok(BuiltWidget {
        widget_type: "form",
        layout: WidgetLayout::Vertical,
        fields: fields_of(&input),
        div: card(with_caption(request, items)).into(),
    })
}
