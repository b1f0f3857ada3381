//! Interactive chart view in the terminal using ratatui.

use crate::plot::{clock_label, Figure, Marker, TraceColor};
use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame, Terminal,
};
use std::io::{self, IsTerminal, Write};

impl TraceColor {
    fn tui(self) -> Color {
        match self {
            Self::Blue => Color::Blue,
            Self::Red => Color::Red,
            Self::Green => Color::Green,
        }
    }
}

fn marker_symbol(marker: Marker) -> symbols::Marker {
    match marker {
        Marker::Circle => symbols::Marker::Braille,
        Marker::Square => symbols::Marker::Block,
    }
}

/// Raw mode plus the alternate screen, undone on drop whichever way the
/// viewer exits
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { out };
        execute!(guard.out, EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.out, LeaveAlternateScreen, cursor::Show);
    }
}

/// Show a figure full-screen until the user closes it.
/// Returns false without touching the terminal when stdout isn't one.
pub fn show_figure(figure: &Figure) -> Result<bool> {
    if !io::stdout().is_terminal() {
        println!(
            "Cannot display '{}': stdout is not a terminal (use --output to save a file)",
            figure.title
        );
        return Ok(false);
    }

    let _guard = TerminalGuard::enter(io::stdout())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    run_viewer(&mut terminal, figure).map(|()| true)
}

fn run_viewer<B: Backend>(terminal: &mut Terminal<B>, figure: &Figure) -> Result<()> {
    loop {
        terminal.draw(|f| {
            let area = f.area();
            render_figure(f, area, figure);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter)
            {
                return Ok(());
            }
        }
    }
}

/// Render the figure as a line chart plus a one-line help bar
pub fn render_figure(f: &mut Frame, area: Rect, figure: &Figure) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(area);

    let datasets: Vec<Dataset> = figure
        .traces
        .iter()
        .map(|trace| {
            Dataset::default()
                .name(trace.label)
                .marker(marker_symbol(trace.marker))
                .graph_type(GraphType::Line)
                .style(Style::default().fg(trace.color.tui()))
                .data(&trace.points)
        })
        .collect();

    let (x_min, x_max) = figure.x_range();
    let (y_min, y_max) = figure.y_range();
    let x_labels: Vec<Span> = [x_min, (x_min + x_max) / 2.0, x_max]
        .iter()
        .map(|&x| Span::raw(clock_label(x)))
        .collect();
    let y_labels: Vec<Span> = [y_min, (y_min + y_max) / 2.0, y_max]
        .iter()
        .map(|&y| Span::raw(format!("{:.1}", y)))
        .collect();

    let legend = if figure.has_legend() {
        Some(LegendPosition::TopRight)
    } else {
        None
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", figure.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Time")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(figure.y_desc)
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        )
        .legend_position(legend);

    f.render_widget(chart, chunks[0]);

    let help = Paragraph::new(Line::from(vec![
        Span::styled(" q/Esc ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" close chart"),
    ]));
    f.render_widget(help, chunks[1]);
}
