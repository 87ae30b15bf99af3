//! UI module: View components for the TUI.

pub mod detection;
pub mod visualization;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::tui::app::Screen;
use crate::tui::styles::MedicalTheme;

/// Page selector shown above every page.
pub fn render_navigation(f: &mut Frame, area: Rect, screen: Screen) {
    let titles = vec![
        Line::from(" 📈 Visualization "),
        Line::from(" 🫀 Cardiovascular Disease Detection "),
    ];
    let selected = match screen {
        Screen::Visualization => 0,
        Screen::Detection => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider(Span::styled("│", MedicalTheme::border()))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(MedicalTheme::border())
                .title(Span::styled(" Cardiolens ", MedicalTheme::header()))
                .title_bottom(Line::from(vec![
                    Span::styled(" [Tab] ", MedicalTheme::key_hint()),
                    Span::styled("Switch page ", MedicalTheme::key_desc()),
                    Span::styled("[Ctrl+Q] ", MedicalTheme::key_hint()),
                    Span::styled("Quit ", MedicalTheme::key_desc()),
                ])),
        );

    f.render_widget(tabs, area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: This tool provides indicative estimates and does not replace professional medical evaluation.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Charts use a random sample of the dataset with multivariate outliers removed.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
