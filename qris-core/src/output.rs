//! Display formatting shared by every front end.

use rust_decimal::{Decimal, RoundingStrategy};

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format an amount the way Indonesian rupiah is written: `Rp10.250`, `Rp1.234,5`.
///
/// At most two fraction digits are shown, trailing zeros dropped.
pub fn format_rupiah(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = rounded.abs().to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

    if frac.is_empty() {
        format!("{sign}Rp{}", group_thousands(whole))
    } else {
        format!("{sign}Rp{},{frac}", group_thousands(whole))
    }
}

/// Shorten long payload strings for display, keeping both ends.
pub fn truncate_payload(payload: &str, keep: usize) -> String {
    let s = payload.trim();
    if s.chars().count() <= keep * 2 + 3 {
        return s.to_string();
    }

    let start: String = s.chars().take(keep).collect();
    let end: String = s
        .chars()
        .rev()
        .take(keep)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    format!("{start}...{end}")
}
