//! End-to-end cycle scenarios against the real SQLite store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lockwork_core::{
    AlertScheduler, BlockCycleController, BlockType, Collaborators, DisplaySync, HapticFeedback,
    Phase, SessionStore, Settings, SqliteSessionStore,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn secs(n: i64) -> Duration {
    Duration::seconds(n)
}

struct NullDisplay;

impl DisplaySync for NullDisplay {
    fn start(
        &mut self,
        _ends_at: DateTime<Utc>,
        _block_type: BlockType,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn update(
        &mut self,
        _ends_at: DateTime<Utc>,
        _block_type: BlockType,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn end(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

struct NullAlerts;

impl AlertScheduler for NullAlerts {
    fn schedule(
        &mut self,
        _block_type: BlockType,
        _fires_at: DateTime<Utc>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

struct NullHaptics;

impl HapticFeedback for NullHaptics {
    fn trigger(&mut self, _block_type: BlockType) {}
}

fn controller_with_db(
    settings: Settings,
    path: &std::path::Path,
) -> BlockCycleController {
    BlockCycleController::new(
        settings,
        Collaborators {
            store: Box::new(SqliteSessionStore::open_at(path).unwrap()),
            display: Box::new(NullDisplay),
            alerts: Box::new(NullAlerts),
            haptics: Box::new(NullHaptics),
        },
    )
    .unwrap()
}

#[test]
fn focus_completion_persists_session_and_switches_to_break() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sessions.db");
    let mut controller = controller_with_db(Settings::default(), &db_path);

    controller.start_block(t0());
    // Single tick 25 minutes later, as after a long app suspension.
    controller.on_tick(t0() + secs(1500)).unwrap();

    assert_eq!(controller.current_block_type(), BlockType::Break);
    let snap = controller.snapshot(t0() + secs(1500));
    assert_eq!(snap.phase, Phase::Running); // default policy auto-continues
    assert_eq!(snap.remaining_secs, 300);

    // Read the rows back through a second connection.
    let store = SqliteSessionStore::open_at(&db_path).unwrap();
    let sessions = store.list().unwrap();
    assert_eq!(sessions.len(), 2);
    let focus = sessions.iter().find(|s| s.block_type == BlockType::Focus).unwrap();
    assert_eq!(focus.started_at, t0());
    assert_eq!(focus.ended_at, Some(t0() + secs(1500)));
    assert_eq!(sessions.iter().filter(|s| s.is_open()).count(), 1);
}

#[test]
fn pause_then_reset_closes_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sessions.db");
    let mut controller = controller_with_db(Settings::default(), &db_path);

    controller.start_block(t0());
    controller.pause_block(t0() + secs(10));
    assert_eq!(controller.snapshot(t0() + secs(10)).remaining_secs, 1490);

    // Reset much later; session closes at the reset time.
    controller.reset_block(t0() + secs(7200));
    let snap = controller.snapshot(t0() + secs(7200));
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.remaining_secs, 1500);

    let store = SqliteSessionStore::open_at(&db_path).unwrap();
    let sessions = store.list().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].ended_at, Some(t0() + secs(7200)));
}

#[test]
fn alternating_cycle_survives_controller_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sessions.db");

    let state = {
        let mut controller = controller_with_db(Settings::default(), &db_path);
        controller.start_block(t0());
        controller.state()
    };

    // Host restarts; state round-trips through JSON like the CLI does.
    let json = serde_json::to_string(&state).unwrap();
    let state = serde_json::from_str(&json).unwrap();
    let mut controller = BlockCycleController::restore(
        state,
        Settings::default(),
        Collaborators {
            store: Box::new(SqliteSessionStore::open_at(&db_path).unwrap()),
            display: Box::new(NullDisplay),
            alerts: Box::new(NullAlerts),
            haptics: Box::new(NullHaptics),
        },
    )
    .unwrap();

    controller.on_tick(t0() + secs(1500)).unwrap(); // focus done
    controller.on_tick(t0() + secs(1800)).unwrap(); // break done
    assert_eq!(controller.current_block_type(), BlockType::Focus);

    let store = SqliteSessionStore::open_at(&db_path).unwrap();
    let sessions = store.list().unwrap();
    assert_eq!(sessions.len(), 3);
    // Newest first: the reopened focus block, then the closed break/focus.
    assert_eq!(sessions[0].block_type, BlockType::Focus);
    assert!(sessions[0].is_open());
    assert_eq!(sessions[1].block_type, BlockType::Break);
    assert_eq!(sessions[1].duration_min(), 5);
    assert_eq!(sessions[2].block_type, BlockType::Focus);
    assert_eq!(sessions[2].duration_min(), 25);
}
