use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vih_map::app::App;
use vih_map::config::{Cli, Command, ServeArgs};
use vih_map::dashboard::Dashboard;
use vih_map::{data, ui, web};

fn main() -> Result<()> {
    let cli = Cli::parse_args(std::env::args_os()).unwrap_or_else(|err| err.exit());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let schema = cli.data.schema()?;
    let dataset = data::load_dataset(&cli.data.boundaries, &cli.data.cases, &schema);
    info!(
        departments = dataset.len(),
        provenance = dataset.provenance.as_str(),
        crs = %dataset.crs,
        "dataset ready"
    );
    let dashboard = Dashboard::new(dataset, schema);

    match cli.command {
        Some(Command::Tui) => run_tui(dashboard),
        Some(Command::Serve(args)) => run_server(&args, dashboard),
        None => bail!("no subcommand selected"),
    }
}

fn run_server(args: &ServeArgs, dashboard: Dashboard) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(web::serve(args, web::AppState::new(dashboard)))
}

fn run_tui(dashboard: Dashboard) -> Result<()> {
    let mut terminal = ratatui::init();
    terminal.clear()?;

    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, Arc::new(dashboard));

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
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

fn run(terminal: &mut DefaultTerminal, dashboard: Arc<Dashboard>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(dashboard, size.width as usize, size.height as usize)?;

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Year / range selection
                            KeyCode::Char('y') | KeyCode::Char(']') | KeyCode::Tab => app.next_year(),
                            KeyCode::Char('Y') | KeyCode::Char('[') | KeyCode::BackTab => app.prev_year(),

                            KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_view(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            KeyCode::Char('L') => app.map_renderer.toggle_labels(),
                            KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.toggle_outlines(),

                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
