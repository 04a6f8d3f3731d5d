//! Amounts written with `.` as thousands separator and `,` as decimal
//! separator (`1.234,56`).
//!
//! A token is an amount only if it ends in a comma followed by exactly two
//! digits. Tokens without a comma (`1234`, `12.50`) are rejected rather
//! than guessed at.

use std::sync::LazyLock;

use regex::Regex;

/// Full-token amount shape: grouped thousands or a plain digit run, then
/// `,dd`.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}$").expect("valid regex"));

/// Whether `token` is exactly an amount, with no surrounding characters.
#[must_use]
pub fn is_amount_token(token: &str) -> bool {
    AMOUNT_RE.is_match(token)
}

/// Whether `token` looks like a decimal amount but does not have the
/// amount shape (`1.18,5`, `12.34,56`).
#[must_use]
pub fn is_malformed_amount(token: &str) -> bool {
    token.contains(',')
        && token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
        && !is_amount_token(token)
}

/// Parses an amount, ignoring currency symbols and other non-numeric
/// decoration (`R$ 1.185,54` parses as `1185.54`).
///
/// Returns `None` when what remains is not amount-shaped.
#[must_use]
pub fn parse_amount(token: &str) -> Option<f64> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if !is_amount_token(&cleaned) {
        return None;
    }
    let digits: String = cleaned.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().map(cents_to_amount)
}

#[allow(clippy::cast_precision_loss)]
fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[allow(clippy::cast_possible_truncation)]
fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Snaps an amount to the nearest whole cent.
///
/// Sums of snapped amounts are snapped again after every addition, which
/// keeps accumulated totals independent of summation order.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    cents_to_amount(amount_to_cents(amount))
}

/// Renders an amount in the same format [`parse_amount`] reads.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let cents = amount_to_cents(amount);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{:02}", cents % 100)
}
