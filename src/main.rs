mod app;
mod boundary;
mod braille;
mod data;
mod map;
mod stats;
mod ui;

use anyhow::Result;
use app::App;
use boundary::BoundarySet;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use data::Dataset;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to a file so the TUI stays clean; failure to open the log
    // file is not worth refusing to start over.
    let _ = init_logging();

    // Both fatal conditions surface here, before the terminal is touched:
    // a missing dataset file and (via App::new below) a naming-convention
    // mismatch. No partial UI either way.
    let dataset = data::load_dataset(data::DATASET_FILE)?;
    info!("loaded dataset with {} rows", dataset.rows().len());

    // Boundary data is best-effort: any failure leaves the map pane empty
    // while the table still renders.
    let provider = boundary::default_provider();
    let boundaries = boundary::load_once(provider.as_ref()).clone();

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, dataset, boundaries);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn init_logging() -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("crime-map.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(
    terminal: &mut DefaultTerminal,
    dataset: Dataset,
    boundaries: Option<BoundarySet>,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        dataset,
        boundaries,
        size.width as usize,
        size.height as usize,
    )?;

    // Main loop: one event, one redraw. No background work.
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        match event::read()? {
            Event::Key(key) => {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                        // Category selection
                        KeyCode::Tab => app.next_category(),
                        KeyCode::BackTab => app.prev_category(),

                        // Table sort order
                        KeyCode::Char('s') | KeyCode::Char('S') => app.toggle_sort(),

                        // Pan with hjkl or arrow keys
                        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                        // Zoom
                        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                        // Layer toggles
                        KeyCode::Char('f') | KeyCode::Char('F') => {
                            if let Some(renderer) = &mut app.map_renderer {
                                renderer.toggle_fills();
                            }
                        }
                        KeyCode::Char('L') => {
                            if let Some(renderer) = &mut app.map_renderer {
                                renderer.toggle_labels();
                            }
                        }

                        // Reset view
                        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                        _ => {}
                    }
                }
            }
            Event::Mouse(mouse) => {
                handle_mouse(&mut app, mouse);
            }
            Event::Resize(width, height) => {
                app.resize(width as usize, height as usize);
            }
            _ => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
