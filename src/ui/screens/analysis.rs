use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::engine::summary::{MonthlyAmounts, Summary};
use crate::engine::Period;
use crate::models::{Bucket, Month};
use crate::ui::app::{App, Session};
use crate::ui::theme;
use crate::ui::util::{format_amount, format_percent, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Yearly cards
            Constraint::Length(4), // Quick stats
            Constraint::Min(8),    // Distribution
            Constraint::Min(10),   // Monthly trend
        ])
        .split(area);

    render_cards(f, chunks[0], session);
    render_quick_stats(f, chunks[1], session);
    render_distribution(f, chunks[2], app, session);
    render_trend(f, chunks[3], app, session);
}

fn titled_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .title(Span::styled(title, theme::block_title_style()))
}

fn render_cards(f: &mut Frame, area: Rect, session: &Session) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let yearly = &session.summary().yearly;
    let stats = session.quick_stats();

    render_card(f, cards[0], "Income", format_amount(yearly.income), theme::GREEN);
    render_card(
        f,
        cards[1],
        "Expenses",
        format_amount(yearly.total_expense),
        theme::RED,
    );
    render_card(
        f,
        cards[2],
        "Balance",
        format_amount(yearly.balance),
        theme::signed_color(yearly.balance),
    );
    render_card(
        f,
        cards[3],
        "Savings Rate",
        format_percent(stats.savings_rate),
        stats.savings_rate.map_or(theme::SUBTEXT, theme::signed_color),
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, display: String, color: Color) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            display,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .centered()
    .block(titled_block(format!(" {title} ")));

    f.render_widget(text, area);
}

fn render_quick_stats(f: &mut Frame, area: Rect, session: &Session) {
    let stats = session.quick_stats();
    let yearly = &session.summary().yearly;

    let top = match &stats.top_expense {
        Some((name, amount)) => format!("{name} ({})", format_amount(*amount)),
        None => "—".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Avg monthly surplus  ", theme::dim_style()),
            Span::styled(
                format_amount(stats.avg_monthly_surplus),
                Style::default().fg(theme::signed_color(stats.avg_monthly_surplus)),
            ),
            Span::styled("    Largest expense  ", theme::dim_style()),
            Span::styled(top, theme::normal_style()),
        ]),
        Line::from(vec![
            Span::styled(" Fixed                ", theme::dim_style()),
            Span::styled(
                format_amount(yearly.fixed_expense),
                theme::bucket_style(Bucket::FixedExpense),
            ),
            Span::styled("    Variable         ", theme::dim_style()),
            Span::styled(
                format_amount(yearly.variable_expense),
                theme::bucket_style(Bucket::VariableExpense),
            ),
        ]),
    ];

    let block = titled_block(format!(" {} · {} ", session.year(), session.space_label()));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_distribution(f: &mut Frame, area: Rect, app: &App, session: &Session) {
    let shares = session.distribution(app.analysis_period);
    let title = format!(" Expenses by Category · {} (h/l to change) ", app.analysis_period);

    if shares.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses planned for this period",
            theme::dim_style(),
        )))
        .centered()
        .block(titled_block(title));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = shares
        .iter()
        .take(12)
        .map(|share| {
            Bar::default()
                .value(share.amount.to_u64().unwrap_or(0))
                .label(Line::from(truncate(&share.name, 10)))
                .text_value(format!("{:.1}%", share.percent))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(theme::badge_style(theme::ACCENT))
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block(title))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(theme::normal_style());

    f.render_widget(chart, area);
}

// ── Monthly trend ─────────────────────────────────────────────

/// Chart points for income, expense and balance, one per month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrendSeries {
    pub(crate) income: Vec<(f64, f64)>,
    pub(crate) expense: Vec<(f64, f64)>,
    pub(crate) balance: Vec<(f64, f64)>,
    /// Lowest and highest amount plotted; always spans zero.
    pub(crate) low: Decimal,
    pub(crate) high: Decimal,
}

impl TrendSeries {
    pub(crate) fn from_summary(summary: &Summary) -> Self {
        let expense: MonthlyAmounts =
            std::array::from_fn(|i| summary.fixed_expense_by_month[i] + summary.variable_expense_by_month[i]);

        let all = summary
            .income_by_month
            .iter()
            .chain(expense.iter())
            .chain(summary.monthly_balance.iter());
        let low = all.clone().copied().fold(Decimal::ZERO, Decimal::min);
        let mut high = all.copied().fold(Decimal::ZERO, Decimal::max);
        if high == low {
            high = low + Decimal::ONE;
        }

        Self {
            income: points(&summary.income_by_month),
            expense: points(&expense),
            balance: points(&summary.monthly_balance),
            low,
            high,
        }
    }

    /// Vertical guide through the given month.
    pub(crate) fn guide(&self, month: Month) -> Vec<(f64, f64)> {
        let x = f64::from(month.number());
        vec![(x, to_f64(self.low)), (x, to_f64(self.high))]
    }
}

fn points(amounts: &MonthlyAmounts) -> Vec<(f64, f64)> {
    Month::all()
        .map(|m| (f64::from(m.number()), to_f64(amounts[m.index()])))
        .collect()
}

fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

fn line<'a>(name: &'a str, data: &'a [(f64, f64)], color: Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data)
}

fn render_trend(f: &mut Frame, area: Rect, app: &App, session: &Session) {
    let trend = TrendSeries::from_summary(session.summary());
    let guide = match app.analysis_period {
        Period::Month(m) => trend.guide(m),
        Period::Year => Vec::new(),
    };

    let mut datasets = vec![
        line("Income", &trend.income, theme::bucket_color(Bucket::Income)),
        line("Expenses", &trend.expense, theme::RED),
        line("Balance", &trend.balance, theme::ACCENT),
    ];
    if let Period::Month(m) = app.analysis_period {
        datasets.push(
            Dataset::default()
                .name(m.short_name())
                .marker(Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme::YELLOW))
                .data(&guide),
        );
    }

    let x_labels: Vec<Span> = Month::all()
        .map(|m| {
            let style = match app.analysis_period {
                Period::Month(sel) if sel == m => theme::heading_style(),
                _ => theme::dim_style(),
            };
            Span::styled(m.short_name(), style)
        })
        .collect();
    let mid = (trend.low + trend.high) / Decimal::TWO;
    let y_labels: Vec<Span> = [trend.low, mid, trend.high]
        .into_iter()
        .map(|v| Span::styled(format_amount(v.round()), theme::dim_style()))
        .collect();

    let chart = Chart::new(datasets)
        .block(titled_block(" Monthly Trend · Income / Expenses / Balance ".to_string()))
        .x_axis(
            Axis::default()
                .style(theme::border_style())
                .bounds([1.0, Month::COUNT as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme::border_style())
                .bounds([to_f64(trend.low), to_f64(trend.high)])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal_macros::dec;

    use super::*;

    fn summary() -> Summary {
        let mut s = Summary::default();
        s.income_by_month[0] = dec!(3000);
        s.fixed_expense_by_month[0] = dec!(1000);
        s.variable_expense_by_month[0] = dec!(500);
        s.monthly_balance[0] = dec!(1500);
        s.fixed_expense_by_month[1] = dec!(800);
        s.monthly_balance[1] = dec!(-800);
        s
    }

    #[test]
    fn test_trend_has_point_per_month() {
        let trend = TrendSeries::from_summary(&summary());
        assert_eq!(trend.income.len(), 12);
        assert_eq!(trend.expense.len(), 12);
        assert_eq!(trend.balance.len(), 12);
        assert_eq!(trend.income[0], (1.0, 3000.0));
        assert_eq!(trend.expense[0], (1.0, 1500.0));
        assert_eq!(trend.expense[1], (2.0, 800.0));
        assert_eq!(trend.balance[1], (2.0, -800.0));
        assert_eq!(trend.balance[11], (12.0, 0.0));
    }

    #[test]
    fn test_trend_bounds_span_all_series() {
        let trend = TrendSeries::from_summary(&summary());
        assert_eq!(trend.low, dec!(-800));
        assert_eq!(trend.high, dec!(3000));

        let guide = trend.guide(Month::new(2).unwrap());
        assert_eq!(guide, vec![(2.0, -800.0), (2.0, 3000.0)]);
    }

    #[test]
    fn test_empty_trend_has_usable_bounds() {
        let trend = TrendSeries::from_summary(&Summary::default());
        assert_eq!(trend.low, Decimal::ZERO);
        assert_eq!(trend.high, Decimal::ONE);
    }
}
