//! Settings form: alert thresholds and the e-mail notification block.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::{NotificationConfig, ThresholdConfig};
use crate::ui::theme::{ACCENT, MUTED};
use crate::ui::InputMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Cpu,
    Memory,
    Disk,
    Enabled,
    SmtpServer,
    SmtpPort,
    Sender,
    Recipient,
    Password,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Cpu,
        Field::Memory,
        Field::Disk,
        Field::Enabled,
        Field::SmtpServer,
        Field::SmtpPort,
        Field::Sender,
        Field::Recipient,
        Field::Password,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Cpu => "CPU threshold %",
            Field::Memory => "Memory threshold %",
            Field::Disk => "Disk threshold %",
            Field::Enabled => "Notifications",
            Field::SmtpServer => "SMTP server",
            Field::SmtpPort => "SMTP port",
            Field::Sender => "Sender e-mail",
            Field::Recipient => "Recipient e-mail",
            Field::Password => "Sender password",
        }
    }

    pub fn is_threshold(self) -> bool {
        matches!(self, Field::Cpu | Field::Memory | Field::Disk)
    }
}

/// Text-backed copy of the settings, edited in place and parsed on save.
/// Fields the user touched are remembered until their block is saved, so a
/// reload from the backend never overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: String,
    pub sender: String,
    pub recipient: String,
    pub password: String,
    edited: Vec<Field>,
}

impl SettingsForm {
    pub fn from_config(t: &ThresholdConfig, n: &NotificationConfig) -> Self {
        Self {
            cpu: t.cpu.to_string(),
            memory: t.memory.to_string(),
            disk: t.disk.to_string(),
            enabled: n.enabled,
            smtp_server: n.smtp_server.clone(),
            smtp_port: n.smtp_port.to_string(),
            sender: n.sender_email.clone(),
            recipient: n.recipient_email.clone(),
            password: String::new(),
            edited: Vec::new(),
        }
    }

    /// Backend values with the pending edits laid over them.
    pub fn refreshed(&self, t: &ThresholdConfig, n: &NotificationConfig) -> Self {
        let mut next = Self::from_config(t, n);
        for &field in &self.edited {
            next.set(field, self.value(field));
        }
        next
    }

    pub fn is_edited(&self, field: Field) -> bool {
        self.edited.contains(&field)
    }

    pub fn toggle_enabled(&mut self) {
        let flipped = if self.enabled { "off" } else { "on" };
        self.set(Field::Enabled, flipped.into());
    }

    /// Forget the pending edits of one block after it was saved.
    pub fn commit(&mut self, thresholds: bool) {
        self.edited.retain(|f| f.is_threshold() != thresholds);
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Cpu => self.cpu.clone(),
            Field::Memory => self.memory.clone(),
            Field::Disk => self.disk.clone(),
            Field::Enabled => if self.enabled { "on" } else { "off" }.into(),
            Field::SmtpServer => self.smtp_server.clone(),
            Field::SmtpPort => self.smtp_port.clone(),
            Field::Sender => self.sender.clone(),
            Field::Recipient => self.recipient.clone(),
            Field::Password => self.password.clone(),
        }
    }

    pub fn set(&mut self, field: Field, text: String) {
        if !self.edited.contains(&field) {
            self.edited.push(field);
        }
        match field {
            Field::Cpu => self.cpu = text,
            Field::Memory => self.memory = text,
            Field::Disk => self.disk = text,
            Field::Enabled => self.enabled = matches!(text.trim(), "on" | "true" | "1" | "yes"),
            Field::SmtpServer => self.smtp_server = text,
            Field::SmtpPort => self.smtp_port = text,
            Field::Sender => self.sender = text,
            Field::Recipient => self.recipient = text,
            Field::Password => self.password = text,
        }
    }

    pub fn thresholds(&self) -> Result<ThresholdConfig, String> {
        let p = |label: &str, s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| format!("{label} must be a whole number"))
        };
        Ok(ThresholdConfig {
            cpu: p("CPU threshold", &self.cpu)?,
            memory: p("Memory threshold", &self.memory)?,
            disk: p("Disk threshold", &self.disk)?,
        })
    }

    pub fn notification(&self) -> Result<NotificationConfig, String> {
        let smtp_port = self
            .smtp_port
            .trim()
            .parse::<u16>()
            .map_err(|_| "SMTP port must be a number between 0 and 65535".to_string())?;
        Ok(NotificationConfig {
            enabled: self.enabled,
            smtp_server: self.smtp_server.trim().to_string(),
            smtp_port,
            sender_email: self.sender.trim().to_string(),
            recipient_email: self.recipient.trim().to_string(),
            sender_password: self.password.clone(),
        })
    }
}

pub fn draw_settings(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    form: &SettingsForm,
    selected: usize,
    mode: InputMode,
    input: &str,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let line = |i: usize, field: Field| {
        let editing = i == selected && mode == InputMode::Edit;
        let value = if editing {
            let shown = if field == Field::Password { "*".repeat(input.chars().count()) } else { input.to_string() };
            format!("{shown}_")
        } else if field == Field::Password {
            if form.password.is_empty() { "(unchanged)".into() } else { "*".repeat(form.password.chars().count()) }
        } else {
            form.value(field)
        };
        let style = if i == selected {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{:<20}", field.label()), style),
            Span::raw(value),
        ])
    };

    let (thresholds, email): (Vec<_>, Vec<_>) = Field::ALL
        .iter()
        .enumerate()
        .partition(|(_, fld)| fld.is_threshold());
    let mut left: Vec<Line> = thresholds.into_iter().map(|(i, fld)| line(i, *fld)).collect();
    left.push(Line::from(""));
    left.push(Line::from(Span::styled("s: save thresholds", Style::default().fg(MUTED))));
    let mut right: Vec<Line> = email.into_iter().map(|(i, fld)| line(i, *fld)).collect();
    right.push(Line::from(""));
    right.push(Line::from(Span::styled(
        "Enter: edit (toggle for Notifications)  s: save e-mail settings",
        Style::default().fg(MUTED),
    )));

    f.render_widget(
        Paragraph::new(left).block(Block::default().borders(Borders::ALL).title("Thresholds")),
        cols[0],
    );
    f.render_widget(
        Paragraph::new(right).block(Block::default().borders(Borders::ALL).title("E-mail notifications")),
        cols[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_round_trips_config_without_password() {
        let t = ThresholdConfig { cpu: 70, memory: 80, disk: 95 };
        let n = NotificationConfig {
            smtp_server: "smtp.example.com".into(),
            sender_password: "old".into(),
            ..NotificationConfig::default()
        };
        let mut form = SettingsForm::from_config(&t, &n);
        assert!(form.password.is_empty());
        assert_eq!(form.thresholds().unwrap(), t);
        form.set(Field::Password, "new".into());
        form.set(Field::Enabled, "off".into());
        let back = form.notification().unwrap();
        assert_eq!(back.sender_password, "new");
        assert!(!back.enabled);
        assert_eq!(back.smtp_server, "smtp.example.com");
    }

    #[test]
    fn pending_edits_survive_a_reload() {
        let t = ThresholdConfig { cpu: 70, memory: 80, disk: 95 };
        let n = NotificationConfig::default();
        let mut form = SettingsForm::from_config(&t, &n);
        form.set(Field::Cpu, "55".into());
        form.toggle_enabled();

        let newer = ThresholdConfig { cpu: 71, memory: 81, disk: 96 };
        let mut form = form.refreshed(&newer, &n);
        assert_eq!(form.cpu, "55");
        assert_eq!(form.memory, "81");
        assert!(!form.enabled);
        assert!(form.is_edited(Field::Enabled));

        form.commit(true);
        assert!(!form.is_edited(Field::Cpu));
        assert!(form.is_edited(Field::Enabled));
        assert_eq!(form.refreshed(&newer, &n).cpu, "71");
    }

    #[test]
    fn bad_numbers_are_reported() {
        let mut form = SettingsForm::from_config(&ThresholdConfig::default(), &NotificationConfig::default());
        form.set(Field::Disk, "ninety".into());
        assert!(form.thresholds().unwrap_err().contains("Disk"));
        form.set(Field::SmtpPort, "70000".into());
        assert!(form.notification().is_err());
    }
}
