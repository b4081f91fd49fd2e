use rust_decimal::Decimal;

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    if val < Decimal::ZERO {
        format!("-${}", group_thousands(val.abs()))
    } else {
        format!("${}", group_thousands(val))
    }
}

/// Grid cell text: no currency sign, blank for zero (unset) amounts.
pub(crate) fn format_cell(val: Decimal) -> String {
    if val.is_zero() {
        return String::new();
    }
    let grouped = group_thousands(val.abs());
    if val < Decimal::ZERO {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn group_thousands(abs: Decimal) -> String {
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    format!("{with_commas}.{dec_part}")
}

/// Percentage with one decimal, or a dash when there is nothing to divide by.
pub(crate) fn format_percent(val: Option<Decimal>) -> String {
    match val {
        Some(p) => format!("{p:.1}%"),
        None => "—".to_string(),
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// The result is guaranteed to be at most `max` characters (counting "…" as one).
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// Move a list cursor down by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_down(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if *index + 1 < len {
        *index += 1;
        if *index >= *scroll + page {
            *scroll = index.saturating_sub(page - 1);
        }
    }
}

/// Move a list cursor up by one, adjusting scroll to keep cursor visible.
pub(crate) fn scroll_up(index: &mut usize, scroll: &mut usize) {
    *index = index.saturating_sub(1);
    if *index < *scroll {
        *scroll = *index;
    }
}

/// Jump cursor to the top of a list.
pub(crate) fn scroll_to_top(index: &mut usize, scroll: &mut usize) {
    *index = 0;
    *scroll = 0;
}

/// Jump cursor to the bottom of a list.
pub(crate) fn scroll_to_bottom(index: &mut usize, scroll: &mut usize, len: usize, page: usize) {
    if len > 0 {
        *index = len - 1;
        *scroll = index.saturating_sub(page.saturating_sub(1));
    }
}

/// First month column to draw so that `selected` stays inside a window of
/// `visible` columns.
pub(crate) fn month_window_start(selected: usize, visible: usize, total: usize) -> usize {
    let visible = visible.clamp(1, total.max(1));
    if selected < visible {
        0
    } else {
        (selected + 1 - visible).min(total.saturating_sub(visible))
    }
}
