use clap::Subcommand;
use lockwork_core::{Session, SessionStore, SqliteSessionStore};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List sessions, newest first
    List {
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
        /// Output JSON instead of formatted lines
        #[arg(long)]
        json: bool,
    },
    /// Delete a session by id
    Delete {
        /// Session id
        id: String,
    },
}

fn render(session: &Session) -> String {
    let duration = if session.is_open() {
        "open".to_string()
    } else {
        format!("{} min", session.duration_min())
    };
    format!(
        "{}  {}  {:<5}  {}",
        session.id,
        session.started_at.format("%Y-%m-%d %H:%M"),
        session.block_type.display_name(),
        duration
    )
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteSessionStore::open()?;

    match action {
        HistoryAction::List { limit, json } => {
            let mut sessions = store.list()?;
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else {
                for session in &sessions {
                    println!("{}", render(session));
                }
            }
        }
        HistoryAction::Delete { id } => {
            let id = Uuid::parse_str(&id)?;
            store.delete(id)?;
            println!("ok");
        }
    }
    Ok(())
}
