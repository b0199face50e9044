//! Interactive terminal panel for a Russound system.
//!
//! Usage: monitor [host] [port]
//!
//! Shows the discovered zone list on the left and the selected zone with its
//! now-playing metadata on the right. Keys: j/k move, Enter select zone,
//! s cycle source, +/- volume, m mute, p power, d DND, y party mode,
//! a/A all zones on/off, q quit.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use russound_rio::{
    DndState, PartyMode, Result, RioClient, SystemConfig, ZoneListEntry, ZoneStatus, DEFAULT_PORT,
};
use std::io;

struct App {
    client: RioClient,
    cursor: usize,
    status_message: String,
}

impl App {
    fn new(client: RioClient, host: &str) -> Self {
        Self {
            client,
            cursor: 0,
            status_message: format!("Connected to {host}. Discovering zones..."),
        }
    }

    fn select_next(&mut self) {
        let count = self.client.zones().len();
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    fn select_previous(&mut self) {
        let count = self.client.zones().len();
        if count > 0 {
            if self.cursor == 0 {
                self.cursor = count - 1;
            } else {
                self.cursor -= 1;
            }
        }
    }

    fn cursor_entry(&self) -> Option<ZoneListEntry> {
        self.client.zones().into_iter().nth(self.cursor)
    }

    fn select_cursor_zone(&mut self) {
        let Some(entry) = self.cursor_entry() else {
            self.status_message = "No zones discovered yet".to_string();
            return;
        };
        match self.client.select_zone(entry.zone) {
            Ok(()) => self.status_message = format!("Selected {}", entry.name),
            Err(e) => self.status_message = format!("Select failed: {e}"),
        }
    }

    /// Switch the selected zone to the next source in discovery order.
    fn cycle_source(&mut self) {
        let sources = self.client.sources();
        if sources.is_empty() {
            self.status_message = "No sources discovered yet".to_string();
            return;
        }
        let position = self
            .client
            .watched_source()
            .and_then(|id| sources.iter().position(|s| s.source == id));
        let next = &sources[position.map_or(0, |i| (i + 1) % sources.len())];
        match self.client.select_source(next.source) {
            Ok(()) => self.status_message = format!("Source: {}", next.name),
            Err(e) => self.status_message = format!("Source switch failed: {e}"),
        }
    }

    fn report(&mut self, action: &str, result: Result<()>) {
        self.status_message = match result {
            Ok(()) => action.to_string(),
            Err(e) => format!("{action} failed: {e}"),
        };
    }
}

fn ui(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.size());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(outer[0]);

    render_zone_list(f, app, panes[0]);
    render_zone_panel(f, app, panes[1]);
    render_status(f, app, outer[1]);
}

fn render_zone_list(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Zones (j/k move, Enter select, q quit) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let zones = app.client.zones();
    if zones.is_empty() {
        let text = Paragraph::new("Waiting for the controller to report zone names...")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(text, area);
        return;
    }

    let current = app.client.current_zone();
    let items: Vec<ListItem> = zones
        .iter()
        .map(|entry| {
            let marker = if current == Some(entry.zone) { "▶ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(entry.name.clone(), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  {}", entry.zone),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.cursor.min(zones.len() - 1)));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(list, area, &mut state);
}

fn render_zone_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Zone (+/- vol, m mute, p power, s source, d dnd, y party, a/A all) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let Some(id) = app.client.current_zone() else {
        let text = Paragraph::new("No zone selected yet.")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(text, area);
        return;
    };
    let Ok(zone) = app.client.zone(id) else {
        return;
    };

    let on = zone.status == ZoneStatus::On;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                "Zone: ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(zone.name.clone()),
            Span::styled(format!("  {id}"), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Power: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{:?}", zone.status),
                if on {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Red)
                },
            ),
        ]),
        Line::from(vec![
            Span::styled("Volume: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{} / 50", zone.volume),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(if zone.mute.is_on() { "  (muted)" } else { "" }),
        ]),
        Line::from(vec![
            Span::styled("Tone: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                "bass {:+}  treble {:+}  balance {:+}",
                zone.bass, zone.treble, zone.balance
            )),
        ]),
        Line::from(vec![
            Span::styled("DND: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{:?}", zone.do_not_disturb),
                if zone.do_not_disturb == DndState::Off {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                },
            ),
            Span::styled("   Party: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{:?}", zone.party_mode),
                if zone.party_mode == PartyMode::Off {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                },
            ),
        ]),
        Line::from(""),
    ];

    if let Some(source) = app.client.watched_source() {
        if let Ok(state) = app.client.source(source) {
            lines.push(Line::from(vec![
                Span::styled(
                    "Source: ",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(state.name.clone()),
                Span::styled(
                    format!("  [{}] {}", source, state.source_type),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
            let now_playing = [
                ("Song", &state.song_name),
                ("Artist", &state.artist_name),
                ("Album", &state.album_name),
                ("Channel", &state.channel_name),
                ("Program", &state.program_service_name),
                ("Radio text", &state.radio_text),
            ];
            for (label, value) in now_playing {
                if !value.is_empty() {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {label}: "), Style::default().fg(Color::Yellow)),
                        Span::raw(value.clone()),
                    ]));
                }
            }
        }
    }

    if let Some(subpage) = app.client.subpage() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Subpage: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{subpage:?}"),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    let text = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(text, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let text = Paragraph::new(app.status_message.clone())
        .block(block)
        .wrap(Wrap { trim: true });

    f.render_widget(text, area);
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = std::env::args()
        .nth(2)
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    // Connect before touching the terminal so errors print normally.
    let client = RioClient::connect(host.clone(), port, SystemConfig::default()).await?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, &host);

    let res = run_app(&mut terminal, &mut app).await;

    app.client.shutdown().await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {}", err);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Poll so the panel keeps refreshing from watch updates.
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
                        KeyCode::Enter => app.select_cursor_zone(),
                        KeyCode::Char('s') => app.cycle_source(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            let res = app.client.volume_up();
                            app.report("Volume up", res);
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            let res = app.client.volume_down();
                            app.report("Volume down", res);
                        }
                        KeyCode::Char('m') => {
                            let res = app.client.mute_toggle();
                            app.report("Mute toggled", res);
                        }
                        KeyCode::Char('p') => {
                            let res = app.client.zone_power_toggle();
                            app.report("Power toggled", res);
                        }
                        KeyCode::Char('d') => {
                            let res = app.client.dnd_toggle();
                            app.report("DND toggled", res);
                        }
                        KeyCode::Char('y') => {
                            let res = app.client.party_mode_toggle();
                            app.report("Party mode toggled", res);
                        }
                        KeyCode::Char('a') => {
                            let res = app.client.all_zones_on();
                            app.report("All zones on", res);
                        }
                        KeyCode::Char('A') => {
                            let res = app.client.all_zones_off();
                            app.report("All zones off", res);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
