use chrono::Utc;
use clap::Subcommand;
use lockwork_core::services::{LoggingAlertScheduler, LoggingDisplaySync, LoggingHaptics};
use lockwork_core::{BlockCycleController, Collaborators, CycleState, Settings, SqliteSessionStore};

const STATE_KEY: &str = "cycle_state";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the current block
    Start,
    /// Pause the running block
    Pause,
    /// Stop the block and rewind to its full duration
    Reset,
    /// Process any due completion and print the current state as JSON
    Status,
    /// Drive the timer with a periodic tick until Ctrl-C
    Watch {
        /// Tick interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

/// Rebuild the controller from the state persisted by the previous
/// invocation. A corrupt state blob falls back to a fresh idle cycle.
fn load_controller(kv: &SqliteSessionStore) -> Result<BlockCycleController, Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let collaborators = Collaborators {
        store: Box::new(SqliteSessionStore::open()?),
        display: Box::new(LoggingDisplaySync),
        alerts: Box::new(LoggingAlertScheduler),
        haptics: Box::new(LoggingHaptics),
    };
    let state = kv
        .kv_get(STATE_KEY)?
        .and_then(|json| serde_json::from_str::<CycleState>(&json).ok());
    let controller = match state {
        Some(state) => BlockCycleController::restore(state, settings, collaborators)?,
        None => BlockCycleController::new(settings, collaborators)?,
    };
    Ok(controller)
}

fn save_controller(
    kv: &SqliteSessionStore,
    controller: &BlockCycleController,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(&controller.state())?;
    kv.kv_set(STATE_KEY, &json)?;
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let kv = SqliteSessionStore::open()?;
    let mut controller = load_controller(&kv)?;

    match action {
        TimerAction::Start => {
            let now = Utc::now();
            match controller.start_block(now) {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&controller.snapshot(now))?),
            }
        }
        TimerAction::Pause => {
            let now = Utc::now();
            match controller.pause_block(now) {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&controller.snapshot(now))?),
            }
        }
        TimerAction::Reset => {
            let event = controller.reset_block(Utc::now());
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Status => {
            // A completion that fell due while no process was running is
            // handled here, however late the invocation is.
            let now = Utc::now();
            let completed = controller.on_tick(now);
            println!("{}", serde_json::to_string_pretty(&controller.snapshot(now))?);
            if let Some(event) = completed {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
        }
        TimerAction::Watch { interval_ms } => {
            watch(&kv, &mut controller, interval_ms)?;
        }
    }

    save_controller(&kv, &controller)?;
    Ok(())
}

/// Periodic tick loop. The cadence is best-effort only: the engine
/// derives remaining time from absolute timestamps, so delayed or
/// missed ticks cannot skew the countdown.
fn watch(
    kv: &SqliteSessionStore,
    controller: &mut BlockCycleController,
    interval_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.subscribe(Box::new(|snapshot| {
        tracing::info!(
            phase = ?snapshot.phase,
            block = snapshot.block_type.as_str(),
            remaining = %snapshot.formatted_remaining(),
            "transition"
        );
    }));
    if controller.start_block(Utc::now()).is_none() {
        tracing::info!("block already running");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut ticks = tokio::time::interval(std::time::Duration::from_millis(interval_ms.max(100)));
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let now = Utc::now();
                    if let Some(event) = controller.on_tick(now) {
                        println!("{}", serde_json::to_string_pretty(&event)?);
                    }
                    controller.publish_if_due(now);
                }
                _ = tokio::signal::ctrl_c() => {
                    // Stop delivering ticks and leave the block paused so
                    // the next invocation resumes where we left off.
                    let now = Utc::now();
                    if let Some(event) = controller.pause_block(now) {
                        println!("{}", serde_json::to_string_pretty(&event)?);
                    }
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    save_controller(kv, controller)
}
