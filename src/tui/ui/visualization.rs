//! Visualization page: donut, bar and scatter views of the filtered sample.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::application::{FilterOutcome, VisualSample};
use crate::domain::charts::{Histogram, NominalColumn, NumericColumn, ScatterSeries, Slice};
use crate::tui::styles::MedicalTheme;

/// Chart shown on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTab {
    Donut,
    Bar,
    Scatter,
}

impl ChartTab {
    pub const ALL: [ChartTab; 3] = [ChartTab::Donut, ChartTab::Bar, ChartTab::Scatter];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Donut => "Donut Chart",
            Self::Bar => "Bar Chart",
            Self::Scatter => "Scatter Plot",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Donut => 0,
            Self::Bar => 1,
            Self::Scatter => 2,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Selections on the visualization page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizationState {
    pub tab: ChartTab,
    /// Nominal column used for colour
    pub color: NominalColumn,
    pub x: NumericColumn,
    pub y: NumericColumn,
}

impl Default for VisualizationState {
    fn default() -> Self {
        Self {
            tab: ChartTab::Donut,
            color: NominalColumn::Gender,
            x: NumericColumn::Age,
            y: NumericColumn::Height,
        }
    }
}

/// Aggregated data for the active chart.
#[derive(Debug, Clone)]
pub enum ChartView {
    Donut(Vec<Slice>),
    Bar(Histogram),
    Scatter {
        series: Vec<ScatterSeries>,
        x_bounds: Option<[f64; 2]>,
        y_bounds: Option<[f64; 2]>,
    },
}

/// Everything the page needs for one frame.
pub struct PageData<'a> {
    pub sample: &'a VisualSample,
    pub chart: ChartView,
}

/// Render the visualization page
pub fn render_visualization(
    f: &mut Frame,
    area: Rect,
    state: &VisualizationState,
    data: Result<PageData<'_>, String>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(2), // Tabs
            Constraint::Length(1), // Selectors
            Constraint::Min(0),    // Chart
            Constraint::Length(2), // Footer
        ])
        .split(area);

    let data = match data {
        Ok(data) => data,
        Err(message) => {
            render_header(f, chunks[0], None);
            render_error(f, chunks[3], &message);
            render_footer(f, chunks[4]);
            return;
        }
    };

    render_header(f, chunks[0], Some(data.sample));
    render_tabs(f, chunks[1], state.tab);
    render_selectors(f, chunks[2], state);

    match &data.chart {
        ChartView::Donut(slices) => render_donut(f, chunks[3], state.color, slices),
        ChartView::Bar(histogram) => render_bar(f, chunks[3], state, histogram),
        ChartView::Scatter {
            series,
            x_bounds,
            y_bounds,
        } => render_scatter(f, chunks[3], state, series, *x_bounds, *y_bounds),
    }

    render_footer(f, chunks[4]);
}

fn render_header(f: &mut Frame, area: Rect, sample: Option<&VisualSample>) {
    let mut lines = vec![Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Cardiovascular Disease Visualization", MedicalTheme::title()),
    ])];

    if let Some(sample) = sample {
        let mut spans = vec![
            Span::styled(" Sample: ", MedicalTheme::text_secondary()),
            Span::styled(sample.drawn().to_string(), MedicalTheme::text()),
            Span::styled(" │ Shown: ", MedicalTheme::text_secondary()),
            Span::styled(sample.records().len().to_string(), MedicalTheme::text()),
        ];
        match sample.outcome() {
            FilterOutcome::Applied {
                critical_value,
                removed,
            } => {
                spans.push(Span::styled(" │ Outliers removed: ", MedicalTheme::text_secondary()));
                spans.push(Span::styled(removed.to_string(), MedicalTheme::text()));
                spans.push(Span::styled(" │ Critical value: ", MedicalTheme::text_secondary()));
                spans.push(Span::styled(format!("{critical_value:.4}"), MedicalTheme::info()));
            }
            FilterOutcome::Skipped(reason) => {
                spans.push(Span::styled(
                    format!(" │ Outlier filter skipped: {reason}"),
                    MedicalTheme::warning(),
                ));
            }
        }
        lines.push(Line::from(spans));
    }

    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, area);
}

fn render_tabs(f: &mut Frame, area: Rect, tab: ChartTab) {
    let titles: Vec<Line> = ChartTab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" {} {} ", i + 1, t.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(tab.index())
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider(Span::styled("│", MedicalTheme::border()));
    f.render_widget(tabs, area);
}

fn render_selectors(f: &mut Frame, area: Rect, state: &VisualizationState) {
    let mut spans = Vec::new();
    if state.tab != ChartTab::Donut {
        spans.push(Span::styled(" [x] ", MedicalTheme::key_hint()));
        spans.push(Span::styled("Numerical: ", MedicalTheme::key_desc()));
        spans.push(Span::styled(state.x.name(), MedicalTheme::focused()));
    }
    if state.tab == ChartTab::Scatter {
        spans.push(Span::styled("  [y] ", MedicalTheme::key_hint()));
        spans.push(Span::styled("Numerical (y): ", MedicalTheme::key_desc()));
        spans.push(Span::styled(state.y.name(), MedicalTheme::focused()));
    }
    spans.push(Span::styled("  [c] ", MedicalTheme::key_hint()));
    spans.push(Span::styled("Nominal: ", MedicalTheme::key_desc()));
    spans.push(Span::styled(state.color.name(), MedicalTheme::focused()));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_donut(f: &mut Frame, area: Rect, column: NominalColumn, slices: &[Slice]) {
    let block = Block::default()
        .title(Span::styled(format!(" Share of {column} "), MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let constraints: Vec<Constraint> = slices
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (i, slice) in slices.iter().enumerate() {
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(format!(" {} ", slice.label), MedicalTheme::text_secondary()))
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            )
            .gauge_style(Style::default().fg(MedicalTheme::category(i)))
            .ratio(slice.share.clamp(0.0, 1.0))
            .label(format!("{} ({:.1}%)", slice.count, slice.share * 100.0));
        f.render_widget(gauge, rows[i]);
    }
}

fn legend(categories: impl Iterator<Item = String>) -> Line<'static> {
    let spans: Vec<Span> = categories
        .enumerate()
        .flat_map(|(i, label)| {
            [
                Span::styled(" ■ ", Style::default().fg(MedicalTheme::category(i))),
                Span::styled(label, MedicalTheme::text_secondary()),
            ]
        })
        .collect();
    Line::from(spans)
}

fn render_bar(f: &mut Frame, area: Rect, state: &VisualizationState, histogram: &Histogram) {
    let block = Block::default()
        .title(Span::styled(
            format!(" Count of {} by {} ", state.x, state.color),
            MedicalTheme::subtitle(),
        ))
        .title_bottom(legend(
            histogram.categories.iter().map(|&code| state.color.label(code)),
        ))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let bins = histogram.bins().max(1) as u16;
    let categories = histogram.categories.len().max(1) as u16;
    let usable = block.inner(area).width.saturating_sub(bins);
    let bar_width = (usable / (bins * categories)).max(1);

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(1);

    for (bin, counts) in histogram.counts.iter().enumerate() {
        let bars: Vec<Bar> = counts
            .iter()
            .enumerate()
            .map(|(c, &n)| {
                Bar::default()
                    .value(n as u64)
                    .style(Style::default().fg(MedicalTheme::category(c)))
            })
            .collect();
        let label = format!("{:.0}", histogram.edges[bin]);
        chart = chart.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }

    f.render_widget(chart, area);
}

fn padded([lo, hi]: [f64; 2]) -> [f64; 2] {
    let pad = ((hi - lo) * 0.05).max(0.5);
    [lo - pad, hi + pad]
}

fn render_scatter(
    f: &mut Frame,
    area: Rect,
    state: &VisualizationState,
    series: &[ScatterSeries],
    x_bounds: Option<[f64; 2]>,
    y_bounds: Option<[f64; 2]>,
) {
    let x_bounds = padded(x_bounds.unwrap_or([0.0, 1.0]));
    let y_bounds = padded(y_bounds.unwrap_or([0.0, 1.0]));

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(MedicalTheme::category(i)))
                .data(&s.points)
        })
        .collect();

    let axis_labels = |[lo, hi]: [f64; 2]| {
        vec![
            Line::from(format!("{lo:.0}")),
            Line::from(format!("{:.0}", (lo + hi) / 2.0)),
            Line::from(format!("{hi:.0}")),
        ]
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} vs {} by {} ", state.y, state.x, state.color),
                    MedicalTheme::subtitle(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        )
        .x_axis(
            Axis::default()
                .title(state.x.name())
                .style(MedicalTheme::text_secondary())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .title(state.y.name())
                .style(MedicalTheme::text_secondary())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );

    f.render_widget(chart, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Dataset unavailable", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[1-3/←→] ", MedicalTheme::key_hint()),
        Span::styled("Chart ", MedicalTheme::key_desc()),
        Span::styled("[c] ", MedicalTheme::key_hint()),
        Span::styled("Nominal ", MedicalTheme::key_desc()),
        Span::styled("[x/y] ", MedicalTheme::key_hint()),
        Span::styled("Numerical ", MedicalTheme::key_desc()),
        Span::styled("[r] ", MedicalTheme::key_hint()),
        Span::styled("New sample", MedicalTheme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        assert_eq!(ChartTab::Donut.next(), ChartTab::Bar);
        assert_eq!(ChartTab::Scatter.next(), ChartTab::Donut);
        assert_eq!(ChartTab::Donut.prev(), ChartTab::Scatter);
    }

    #[test]
    fn test_padded_bounds() {
        assert_eq!(padded([0.0, 100.0]), [-5.0, 105.0]);
        // Constant columns still get a visible range.
        assert_eq!(padded([10.0, 10.0]), [9.5, 10.5]);
    }
}
