use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::models::{Bucket, Month};
use crate::ui::app::{App, Session};
use crate::ui::theme;
use crate::ui::util::{format_cell, month_window_start, truncate};

const NAME_WIDTH: u16 = 18;
const CELL_WIDTH: u16 = 11;
const TOTAL_WIDTH: u16 = 13;
/// Income, fixed, variable, balance, plus borders and header.
pub(crate) const FOOTER_HEIGHT: u16 = 7;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(FOOTER_HEIGHT)])
        .split(area);

    let visible = visible_months(area.width);
    let first = month_window_start(app.month_index, visible, Month::COUNT);
    let months: Vec<Month> = Month::all().skip(first).take(visible).collect();

    if session.rows().is_empty() {
        render_empty(f, chunks[0]);
    } else {
        render_grid(f, chunks[0], app, session, &months);
    }
    render_totals(f, chunks[1], session, &months);
}

fn visible_months(width: u16) -> usize {
    let free = width.saturating_sub(2 + NAME_WIDTH + TOTAL_WIDTH);
    usize::from(free / CELL_WIDTH).clamp(1, Month::COUNT)
}

fn header_row(months: &[Month]) -> Row<'static> {
    let mut cells = vec![Cell::from("Category")];
    cells.extend(months.iter().map(|m| Cell::from(format!("{m:>10}"))));
    cells.push(Cell::from(format!("{:>12}", "Total")));
    Row::new(cells).style(theme::header_style())
}

fn widths(months: &[Month]) -> Vec<Constraint> {
    let mut w = vec![Constraint::Length(NAME_WIDTH)];
    w.extend(months.iter().map(|_| Constraint::Length(CELL_WIDTH)));
    w.push(Constraint::Length(TOTAL_WIDTH));
    w
}

fn bucket_tag(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Income => "+",
        Bucket::FixedExpense => "F",
        Bucket::VariableExpense => "V",
    }
}

/// Cells holding an unsaved edit, gathered once per frame.
pub(crate) fn pending_cells(session: &Session) -> HashSet<(i64, Month)> {
    session
        .buffer()
        .peek()
        .map(|edit| (edit.category_id, edit.month))
        .collect()
}

fn render_grid(f: &mut Frame, area: Rect, app: &App, session: &Session, months: &[Month]) {
    let page = area.height.saturating_sub(3) as usize;
    let selected_month = app.selected_month();
    let pending = pending_cells(session);

    let rows: Vec<Row> = session
        .rows()
        .iter()
        .enumerate()
        .skip(app.row_scroll)
        .take(page.max(1))
        .map(|(i, row)| {
            let is_selected_row = i == app.row_index;
            let base = if is_selected_row {
                theme::selected_row_style()
            } else if i % 2 == 0 {
                theme::striped_row_style()
            } else {
                theme::normal_style()
            };

            let bucket = row.category.bucket();
            let mut cells = vec![Cell::from(Span::styled(
                format!("{} {}", bucket_tag(bucket), truncate(&row.category.name, 15)),
                base.patch(theme::bucket_style(bucket)),
            ))];

            for &month in months {
                let is_pending = pending.contains(&(row.category.id, month));
                let text = format!(
                    "{:>9}{}",
                    format_cell(row.amount(month)),
                    if is_pending { "*" } else { " " }
                );
                let style = if is_selected_row && month == selected_month {
                    theme::cursor_style()
                } else if is_pending {
                    theme::pending_style(base)
                } else {
                    base
                };
                cells.push(Cell::from(Span::styled(text, style)));
            }

            cells.push(Cell::from(Span::styled(
                format!("{:>12}", format_cell(row.total)),
                base.add_modifier(Modifier::BOLD),
            )));
            Row::new(cells).style(base)
        })
        .collect();

    let title = format!(
        " {} · {} ({}/{}) ",
        session.year(),
        session.space_label(),
        app.row_index + 1,
        session.rows().len()
    );

    let table = Table::new(rows, widths(months))
        .header(header_row(months))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::border_style())
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )),
        );

    f.render_widget(table, area);
}

fn render_totals(f: &mut Frame, area: Rect, session: &Session, months: &[Month]) {
    let summary = session.summary();

    let mut rows: Vec<Row> = Bucket::all()
        .iter()
        .map(|&bucket| {
            let amounts = summary.by_bucket(bucket);
            total_row(
                bucket.label(),
                months.iter().map(|m| amounts[m.index()]),
                summary.yearly_for(bucket),
                theme::bucket_style(bucket),
            )
        })
        .collect();

    let balance_total = summary.yearly.balance;
    rows.push(
        total_row(
            "Balance",
            months.iter().map(|m| summary.balance(*m)),
            balance_total,
            Style::default().fg(theme::signed_color(balance_total)),
        )
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let table = Table::new(rows, widths(months))
        .header(header_row(months))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::border_style())
                .title(Span::styled(" Totals ", theme::block_title_style())),
        );

    f.render_widget(table, area);
}

fn total_row<'a>(
    label: &'a str,
    amounts: impl Iterator<Item = Decimal>,
    total: Decimal,
    style: Style,
) -> Row<'a> {
    let mut cells = vec![Cell::from(Span::styled(truncate(label, 17), style))];
    cells.extend(amounts.map(|a| Cell::from(format!("{:>9} ", format_cell(a)))));
    cells.push(Cell::from(Span::styled(format!("{:>12}", format_cell(total)), style)));
    Row::new(cells).style(theme::normal_style())
}

fn render_empty(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .title(Span::styled(" Planner ", theme::block_title_style()));
    let msg = Paragraph::new("No categories yet. Add one with :category <name> income|fixed|variable")
        .style(theme::dim_style())
        .centered()
        .block(block);
    f.render_widget(msg, area);
}
