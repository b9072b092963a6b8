//! Terminal user interface for the recorder widget.
//!
//! Renders the fixed widget surface: a title label, the monospace MM:SS
//! readout, a circular record toggle (green while idle, red while recording),
//! a rectangular Done button and a footer with key hints. Capture failures
//! are shown inline as a red error line instead of being silently logged.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::Paragraph,
};
use std::error::Error;
use std::io::{stdout, Stdout};

/// User input command in the recorder widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCommand {
    /// No key pressed (keep rendering)
    Continue,
    /// Start or stop recording (Space or Enter)
    ToggleRecording,
    /// Signal completion to the host ('d')
    Done,
    /// Leave the widget (Escape, 'q' or Ctrl+C)
    Quit,
}

/// Full-screen recorder widget.
pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    error: Option<String>,
}

impl RecorderTui {
    /// Creates the widget and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    pub fn new(title: String) -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(RecorderTui {
            terminal,
            title,
            error: None,
        })
    }

    /// Shows a capture failure inline until the next successful start.
    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Renders the widget surface.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, is_recording: bool, elapsed: &str) -> Result<(), Box<dyn Error>> {
        let title = self.title.clone();
        let error = self.error.clone();
        let elapsed = elapsed.to_string();

        self.terminal.draw(|frame| {
            let area = frame.area();

            let (toggle_color, toggle_hint) = if is_recording {
                (Color::Rgb(255, 68, 68), "stop")
            } else {
                (Color::Rgb(76, 175, 80), "record")
            };

            let mut lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(
                    elapsed,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(vec![
                    Span::styled("⬤", Style::default().fg(toggle_color)),
                    Span::raw(format!("  {toggle_hint}")),
                ]),
                Line::default(),
                Line::from(Span::styled(
                    "  Done  ",
                    Style::default()
                        .fg(Color::Rgb(255, 255, 255))
                        .bg(Color::Rgb(33, 150, 243)),
                )),
            ];

            if let Some(message) = &error {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                )));
            }

            let content_height = lines.len() as u16;
            let content_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(content_height) / 2,
                width: area.width,
                height: content_height.min(area.height),
            };

            frame.render_widget(
                Paragraph::new(lines).alignment(Alignment::Center),
                content_area,
            );

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let footer = Paragraph::new(Line::from(Span::raw(
                " space record/stop · d done · q quit",
            )))
            .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Processes user input and returns the appropriate widget command.
    ///
    /// # Returns
    /// - `Continue` if no key or an unrecognized key was pressed
    /// - `ToggleRecording` on Space or Enter
    /// - `Done` on an unmodified 'd' (Ctrl+D passes through terminals as EOF)
    /// - `Quit` on Escape, 'q' or Ctrl+C
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> Result<WidgetCommand, Box<dyn Error>> {
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(command_for_key(key));
            }
        }
        Ok(WidgetCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<(), Box<dyn Error>> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// Maps a key event to its widget command.
fn command_for_key(key: KeyEvent) -> WidgetCommand {
    match key.code {
        KeyCode::Char(' ') | KeyCode::Enter => {
            tracing::debug!("Toggle key pressed");
            WidgetCommand::ToggleRecording
        }
        KeyCode::Char('d') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            tracing::debug!("'d' pressed: signaling done");
            WidgetCommand::Done
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            tracing::debug!("Escape or 'q' pressed: quitting");
            WidgetCommand::Quit
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            tracing::debug!("Ctrl+C pressed: quitting");
            WidgetCommand::Quit
        }
        _ => WidgetCommand::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn space_and_enter_toggle_recording() {
        assert_eq!(
            command_for_key(plain(KeyCode::Char(' '))),
            WidgetCommand::ToggleRecording
        );
        assert_eq!(
            command_for_key(plain(KeyCode::Enter)),
            WidgetCommand::ToggleRecording
        );
    }

    #[test]
    fn plain_d_signals_done_but_ctrl_d_does_not() {
        assert_eq!(
            command_for_key(plain(KeyCode::Char('d'))),
            WidgetCommand::Done
        );
        assert_eq!(command_for_key(ctrl('d')), WidgetCommand::Continue);
    }

    #[test]
    fn quit_keys_quit_and_plain_c_does_not() {
        assert_eq!(
            command_for_key(plain(KeyCode::Char('q'))),
            WidgetCommand::Quit
        );
        assert_eq!(command_for_key(plain(KeyCode::Esc)), WidgetCommand::Quit);
        assert_eq!(command_for_key(ctrl('c')), WidgetCommand::Quit);
        assert_eq!(
            command_for_key(plain(KeyCode::Char('c'))),
            WidgetCommand::Continue
        );
    }
}
