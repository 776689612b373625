pub mod app;
pub mod event;
pub mod logging;
pub mod ui;

use std::io;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use scour::http::SearchClient;
use scour::query::SearchRequest;

use crate::tui::app::App;
use crate::tui::event::{AppEvent, Event};
use crate::tui::ui::draw;

/// Network jobs handed to the worker task
enum Job {
    Search { seq: u64, request: SearchRequest },
    Delete { id: String },
}

/// Run the interactive search console against `endpoint`
pub async fn run(endpoint: String) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let client = SearchClient::new(endpoint)?;

    // Create app state
    let mut app = App::new();

    // Network worker. Each job runs in its own task, so a slow response never
    // blocks a newer request; ordering is enforced on the app side through
    // the sequence numbers the jobs carry.
    let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Job>();
    let event_sender = app.event_sender();
    tokio::spawn(async move {
        while let Some(job) = job_rx.recv().await {
            let client = client.clone();
            let events = event_sender.clone();
            tokio::spawn(async move {
                match job {
                    Job::Search { seq, request } => {
                        let event = match client.execute(&request).await {
                            Ok(hits) => AppEvent::SearchCompleted { seq, hits },
                            Err(e) => AppEvent::SearchFailed {
                                seq,
                                detail: e.to_string(),
                            },
                        };
                        let _ = events.send(Event::App(event));
                    }
                    Job::Delete { id } => {
                        let event = match client.delete(&id).await {
                            Ok(message) => AppEvent::DeleteCompleted { id, message },
                            Err(e) => AppEvent::DeleteFailed {
                                id,
                                detail: e.to_string(),
                            },
                        };
                        let _ = events.send(Event::App(event));
                    }
                }
            });
        }
    });

    terminal.clear()?;

    // Main event loop
    while !app.should_quit {
        // Draw the current state
        terminal.draw(|f| draw(f, &app))?;

        // Process the next event
        if let Some(event) = app.next_event().await {
            match event {
                Event::App(AppEvent::Search { seq, request }) => {
                    let _ = job_tx.send(Job::Search { seq, request });
                }
                Event::App(AppEvent::Delete { id }) => {
                    let _ = job_tx.send(Job::Delete { id });
                }
                _ => {} // Other events are handled by the App
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
