#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::util::*;

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string() {
    assert_eq!(truncate("Rent", 10), "Rent");
}

#[test]
fn test_truncate_long_category_name() {
    assert_eq!(truncate("Internet & Phone", 8), "Interne…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("Groceries", 0), "");
}

#[test]
fn test_truncate_unicode() {
    assert_eq!(truncate("café résumé", 5), "café…");
}

// ── format_amount ──────────────────────────────────────────

#[test]
fn test_format_amount_basic() {
    assert_eq!(format_amount(dec!(1234.56)), "$1,234.56");
}

#[test]
fn test_format_amount_zero() {
    assert_eq!(format_amount(dec!(0)), "$0.00");
}

#[test]
fn test_format_amount_negative_large() {
    assert_eq!(format_amount(dec!(-99999.01)), "-$99,999.01");
}

#[test]
fn test_format_amount_pads_decimals() {
    assert_eq!(format_amount(dec!(1.5)), "$1.50");
}

// ── format_cell ────────────────────────────────────────────

#[test]
fn test_format_cell_zero_is_blank() {
    assert_eq!(format_cell(dec!(0)), "");
    assert_eq!(format_cell(dec!(0.00)), "");
}

#[test]
fn test_format_cell_groups_without_sign() {
    assert_eq!(format_cell(dec!(4200)), "4,200.00");
    assert_eq!(format_cell(dec!(-1250.5)), "-1,250.50");
}

// ── format_percent ─────────────────────────────────────────

#[test]
fn test_format_percent() {
    assert_eq!(format_percent(Some(dec!(23.5))), "23.5%");
    assert_eq!(format_percent(None), "—");
}

// ── month_window_start ─────────────────────────────────────

#[test]
fn test_month_window_fits_all() {
    assert_eq!(month_window_start(11, 12, 12), 0);
}

#[test]
fn test_month_window_follows_selection() {
    assert_eq!(month_window_start(0, 4, 12), 0);
    assert_eq!(month_window_start(3, 4, 12), 0);
    assert_eq!(month_window_start(4, 4, 12), 1);
    assert_eq!(month_window_start(11, 4, 12), 8);
}

#[test]
fn test_month_window_zero_visible() {
    assert_eq!(month_window_start(5, 0, 12), 5);
}

// ── scrolling ──────────────────────────────────────────────

#[test]
fn test_scroll_down_moves_window() {
    let (mut index, mut scroll) = (2, 0);
    scroll_down(&mut index, &mut scroll, 10, 3);
    assert_eq!((index, scroll), (3, 1));
}

#[test]
fn test_scroll_down_stops_at_end() {
    let (mut index, mut scroll) = (9, 7);
    scroll_down(&mut index, &mut scroll, 10, 3);
    assert_eq!((index, scroll), (9, 7));
}

#[test]
fn test_scroll_up_pulls_window() {
    let (mut index, mut scroll) = (3, 3);
    scroll_up(&mut index, &mut scroll);
    assert_eq!((index, scroll), (2, 2));
}

#[test]
fn test_scroll_top_and_bottom() {
    let (mut index, mut scroll) = (4, 2);
    scroll_to_bottom(&mut index, &mut scroll, 10, 3);
    assert_eq!((index, scroll), (9, 7));
    scroll_to_top(&mut index, &mut scroll);
    assert_eq!((index, scroll), (0, 0));
}
