//! Cardiovascular disease detection page.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{
    CategoricalSelections, Gender, Level, PatientInput, RiskAssessment, YesNo, MEASUREMENT_RANGE,
};
use crate::tui::styles::MedicalTheme;

/// How a form field is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text in `YYYY-MM-DD`
    Date,
    /// Number within `MEASUREMENT_RANGE`
    Number,
    /// One of a fixed list of labels, cycled with the arrow keys
    Choice(Vec<&'static str>),
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl FormField {
    fn text(label: &'static str, hint: &'static str, value: impl ToString, kind: FieldKind) -> Self {
        Self {
            label,
            hint,
            value: value.to_string(),
            kind,
        }
    }

    fn choice(label: &'static str, options: Vec<&'static str>, value: &'static str) -> Self {
        Self {
            label,
            hint: "←/→ to change",
            value: value.to_string(),
            kind: FieldKind::Choice(options),
        }
    }
}

/// Outcome of the last calculation.
#[derive(Debug, Clone)]
pub enum DetectionResult {
    Assessed(RiskAssessment),
    Failed(String),
}

// Field order on screen.
const BIRTH_DATE: usize = 0;
const HEIGHT: usize = 1;
const WEIGHT: usize = 2;
const AP_HI: usize = 3;
const AP_LO: usize = 4;
const CHOLESTEROL: usize = 5;
const GLUC: usize = 6;
const GENDER: usize = 7;
const SMOKE: usize = 8;
const ALCO: usize = 9;
const ACTIVE: usize = 10;

/// Detection form state
pub struct DetectionFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
    pub result: Option<DetectionResult>,
}

impl Default for DetectionFormState {
    fn default() -> Self {
        let input = PatientInput::default();
        let levels: Vec<&'static str> = Level::ALL.iter().map(|l| l.label()).collect();
        let yes_no: Vec<&'static str> = YesNo::ALL.iter().map(|v| v.label()).collect();
        let genders: Vec<&'static str> = Gender::ALL.iter().map(|g| g.label()).collect();
        let s = input.selections;

        Self {
            fields: vec![
                FormField::text(
                    "Date of Birth",
                    "YYYY-MM-DD",
                    input.birth_date.format("%Y-%m-%d"),
                    FieldKind::Date,
                ),
                FormField::text("Height", "cm (0-200)", input.height, FieldKind::Number),
                FormField::text("Weight", "kg (0-200)", input.weight, FieldKind::Number),
                FormField::text(
                    "Systolic Blood Pressure",
                    "mmHg (0-200)",
                    input.ap_hi,
                    FieldKind::Number,
                ),
                FormField::text(
                    "Diastolic Blood Pressure",
                    "mmHg (0-200)",
                    input.ap_lo,
                    FieldKind::Number,
                ),
                FormField::choice("Cholesterol", levels.clone(), s.cholesterol.label()),
                FormField::choice("Glucose", levels, s.gluc.label()),
                FormField::choice("Gender", genders, s.gender.label()),
                FormField::choice("Smoking", yes_no.clone(), s.smoke.label()),
                FormField::choice("Alcohol Intake", yes_no.clone(), s.alco.label()),
                FormField::choice("Physical Activity", yes_no, s.active.label()),
            ],
            selected_field: 0,
            error_message: None,
            result: None,
        }
    }
}

impl DetectionFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Step a choice field forward or backward.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        let FieldKind::Choice(options) = &field.kind else {
            return;
        };
        let current = options.iter().position(|o| *o == field.value).unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        field.value = options[next].to_string();
        self.error_message = None;
    }

    /// Add a character to the current text field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        let accepted = match field.kind {
            FieldKind::Date => c.is_ascii_digit() || c == '-',
            FieldKind::Number => c.is_ascii_digit() || c == '.',
            FieldKind::Choice(_) => false,
        };
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !matches!(field.kind, FieldKind::Choice(_)) {
            field.value.pop();
        }
    }

    fn number(&self, index: usize) -> Result<f64, String> {
        let field = &self.fields[index];
        let value: f64 = field
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;

        let (min, max) = MEASUREMENT_RANGE;
        if !(min..=max).contains(&value) {
            return Err(format!(
                "{}: Value must be between {min} and {max}",
                field.label
            ));
        }
        Ok(value)
    }

    /// Validate and convert to `PatientInput`
    pub fn to_patient_input(&self) -> Result<PatientInput, String> {
        let birth = &self.fields[BIRTH_DATE];
        let birth_date = NaiveDate::parse_from_str(birth.value.trim(), "%Y-%m-%d")
            .map_err(|_| format!("{}: expected YYYY-MM-DD", birth.label))?;

        let selections = CategoricalSelections::from_labels(
            &self.fields[GENDER].value,
            &self.fields[CHOLESTEROL].value,
            &self.fields[GLUC].value,
            &self.fields[SMOKE].value,
            &self.fields[ALCO].value,
            &self.fields[ACTIVE].value,
        )
        .map_err(|e| e.to_string())?;

        Ok(PatientInput {
            birth_date,
            height: self.number(HEIGHT)?,
            weight: self.number(WEIGHT)?,
            ap_hi: self.number(AP_HI)?,
            ap_lo: self.number(AP_LO)?,
            selections,
        })
    }
}

/// Render the detection page
pub fn render_detection(f: &mut Frame, area: Rect, state: &DetectionFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + result
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    render_form_fields(f, body[0], state);
    render_result(f, body[1], state.result.as_ref());

    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Cardiovascular Disease Detection", MedicalTheme::title()),
        Span::styled(
            " │ Please fill out the following form",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &DetectionFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    // Measurements on the left, categorical answers on the right.
    render_field_column(f, columns[0], &state.fields[..CHOLESTEROL], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[CHOLESTEROL..],
        CHOLESTEROL,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let border_style = if is_selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        };

        let title_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match &field.kind {
            FieldKind::Choice(_) => {
                spans.push(Span::styled("‹ ", MedicalTheme::text_muted()));
                spans.push(Span::styled(field.value.as_str(), MedicalTheme::text()));
                spans.push(Span::styled(" ›", MedicalTheme::text_muted()));
            }
            _ if field.value.is_empty() => {
                spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
            }
            _ => spans.push(Span::styled(field.value.as_str(), MedicalTheme::text())),
        }
        if is_selected && !matches!(field.kind, FieldKind::Choice(_)) {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_result(f: &mut Frame, area: Rect, result: Option<&DetectionResult>) {
    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Headline
            Constraint::Length(3), // Probability
            Constraint::Min(0),    // Band description
        ])
        .margin(1)
        .split(inner);

    match result {
        None => {
            let idle = Paragraph::new(Line::from(Span::styled(
                "Press [Enter] to calculate",
                MedicalTheme::text_muted(),
            )))
            .alignment(Alignment::Center);
            f.render_widget(idle, chunks[0]);
        }
        Some(DetectionResult::Failed(message)) => {
            let content = Paragraph::new(vec![
                Line::from(Span::styled("! Error", MedicalTheme::danger())),
                Line::from(Span::styled(message.as_str(), MedicalTheme::text())),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(content, inner);
        }
        Some(DetectionResult::Assessed(assessment)) => {
            let level = assessment.risk_level();
            let style = MedicalTheme::risk_level(level);

            let headline = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Cardiovascular Disease Risk:",
                    MedicalTheme::text_secondary(),
                )),
                Line::from(Span::styled(
                    format!("{:.2}%", assessment.percentage()),
                    style.add_modifier(Modifier::BOLD),
                )),
            ])
            .alignment(Alignment::Center);
            f.render_widget(headline, chunks[0]);

            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(MedicalTheme::border()),
                )
                .gauge_style(style)
                .ratio(assessment.probability.clamp(0.0, 1.0))
                .label(format!("{level}"));
            f.render_widget(gauge, chunks[1]);

            let description = Paragraph::new(Line::from(Span::styled(
                level.description(),
                MedicalTheme::text_secondary(),
            )))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(description, chunks[2]);
        }
    }
}

fn render_footer(f: &mut Frame, area: Rect, state: &DetectionFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.as_str(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Change option ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Calculate ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Reset form", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
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
    fn test_defaults_convert_to_default_input() {
        let state = DetectionFormState::default();
        let input = state.to_patient_input().expect("defaults are valid");
        assert_eq!(input, PatientInput::default());
    }

    #[test]
    fn test_cycle_choice() {
        let mut state = DetectionFormState::default();
        state.selected_field = CHOLESTEROL;
        state.cycle_choice(true);
        assert_eq!(state.fields[CHOLESTEROL].value, "Above normal");
        state.cycle_choice(false);
        state.cycle_choice(false);
        assert_eq!(state.fields[CHOLESTEROL].value, "Well above normal");

        let input = state.to_patient_input().expect("valid");
        assert_eq!(input.selections.cholesterol, Level::WellAboveNormal);
    }

    #[test]
    fn test_text_input_filters_characters() {
        let mut state = DetectionFormState::default();
        state.selected_field = HEIGHT;
        state.delete_char();
        state.delete_char();
        state.delete_char();
        state.input_char('1');
        state.input_char('x');
        state.input_char('7');
        state.input_char('5');
        assert_eq!(state.fields[HEIGHT].value, "175");

        // Choice fields ignore typing.
        state.selected_field = GENDER;
        state.input_char('1');
        assert_eq!(state.fields[GENDER].value, "Men");
    }

    #[test]
    fn test_out_of_range_number_rejected() {
        let mut state = DetectionFormState::default();
        state.fields[AP_HI].value = "250".into();
        let err = state.to_patient_input().unwrap_err();
        assert!(err.contains("Systolic"));
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut state = DetectionFormState::default();
        state.fields[BIRTH_DATE].value = "2000-13-01".into();
        assert!(state.to_patient_input().is_err());
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut state = DetectionFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, ACTIVE);
        state.next_field();
        assert_eq!(state.selected_field, BIRTH_DATE);
    }
}
