//! Tracker commands: `done`, `measure`, `status`, `signup`, `login`, `logout`.
//!
//! Without a stored session these work on the guest file. After
//! `stride login` they go to the database, falling back to the guest file
//! when the database cannot be reached.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use tracing::{info, warn};

use stride_core::auth::{AuthService, SessionConfig};
use stride_core::measurements::{
    MeasurementField, MeasurementGroup, WeeklyMeasurements, validate_week_index,
};
use stride_core::plan::PlanDay;
use stride_core::progress::WeekAggregator;
use stride_core::store::TrackerStore;
use stride_core::sync::{JsonFileStore, RemoteStore, StoreRemote, SyncState, Tracker};
use stride_db::config::DbConfig;
use stride_db::{PgStore, pool};

use crate::config;

/// Where the tracker keeps device-local state.
#[derive(Debug, Clone)]
pub struct TrackPaths {
    pub guest_file: PathBuf,
    pub session_file: PathBuf,
}

impl TrackPaths {
    pub fn new(guest_file: Option<PathBuf>) -> Self {
        Self {
            guest_file: guest_file.unwrap_or_else(config::default_guest_file),
            session_file: config::session_file(),
        }
    }
}

/// A loaded tracker plus the pool behind its remote, if any.
pub struct OpenTracker {
    pub tracker: Tracker<JsonFileStore>,
    pool: Option<PgPool>,
}

impl OpenTracker {
    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}

fn read_session_token(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            Ok((!token.is_empty()).then(|| token.to_owned()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            Err(e).with_context(|| format!("failed to read session file {}", path.display()))
        }
    }
}

/// Build and load a tracker for this device.
pub async fn open_tracker(paths: &TrackPaths, db_config: &DbConfig) -> Result<OpenTracker> {
    let local = JsonFileStore::new(&paths.guest_file);
    let mut remote: Option<Arc<dyn RemoteStore>> = None;
    let mut db_pool = None;

    if let Some(token) = read_session_token(&paths.session_file)? {
        match pool::create_pool(db_config).await {
            Ok(p) => {
                let store: Arc<dyn TrackerStore> = Arc::new(PgStore::new(p.clone()));
                let auth = AuthService::new(store.clone(), SessionConfig::default());
                remote = Some(Arc::new(StoreRemote::new(auth, store, Some(token))));
                db_pool = Some(p);
            }
            Err(e) => warn!(error = %e, "database unavailable, using guest data"),
        }
    }

    let mut tracker = Tracker::new(local, remote);
    tracker.load().await?;
    Ok(OpenTracker {
        tracker,
        pool: db_pool,
    })
}

fn mode_line(tracker: &Tracker<JsonFileStore>) -> String {
    match (tracker.state(), tracker.user()) {
        (SyncState::Cloud, Some(user)) => format!("Mode: Cloud ({})", user.email),
        (SyncState::CloudDegraded, Some(user)) => {
            format!("Mode: Local ({}, cloud sync unavailable)", user.email)
        }
        (state, _) => format!("Mode: {}", state.label()),
    }
}

/// `stride done <day-id>`: flip a day's done flag.
pub async fn run_done(
    tracker: &mut Tracker<JsonFileStore>,
    day_id: &str,
    plan: Option<&[PlanDay]>,
) -> Result<()> {
    if let Some(plan) = plan {
        if !plan.iter().any(|day| day.id() == day_id) {
            warn!(day_id, "day is not part of the plan");
        }
    }

    let status = tracker.toggle_day(day_id).await?;
    let done = tracker.completions().is_done(day_id);
    println!(
        "{day_id}: {} ({})",
        if done { "done" } else { "not done" },
        status.message()
    );
    println!("{}", mode_line(tracker));
    Ok(())
}

/// Parse a `field=value` argument. The field is the camelCase key, e.g.
/// `chestBust=96`.
pub fn parse_assignment(arg: &str) -> Result<(MeasurementField, String)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("expected field=value, got {arg:?}");
    };
    let field: MeasurementField = key.trim().parse()?;
    Ok((field, value.trim().to_owned()))
}

/// `stride measure --week N field=value...`: update fields of a week's
/// record and save the whole record.
pub async fn run_measure(
    tracker: &mut Tracker<JsonFileStore>,
    week: i64,
    assignments: &[String],
) -> Result<()> {
    let week = validate_week_index(week)?;

    let mut record: WeeklyMeasurements = tracker.measurements().for_week(week);
    for arg in assignments {
        let (field, value) = parse_assignment(arg)?;
        record.set(field, value);
    }

    let status = tracker.save_measurements(week, record).await?;
    println!("Week {week} measurements: {}", status.message());

    print!("{}", render_measurements(&tracker.measurements().for_week(week)));
    println!("{}", mode_line(tracker));
    Ok(())
}

/// Filled-in fields under their check-in form group. Empty groups are
/// left out.
pub fn render_measurements(record: &WeeklyMeasurements) -> String {
    let mut out = String::new();
    for group in MeasurementGroup::ALL {
        let filled: Vec<_> = group
            .fields()
            .filter(|field| !record.get(*field).is_empty())
            .collect();
        if filled.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {group}");
        for field in filled {
            let _ = writeln!(out, "    {}: {}", field.label(), record.get(field));
        }
    }
    out
}

/// `stride status`: sync mode and per-week counts.
pub fn run_status(
    tracker: &Tracker<JsonFileStore>,
    plan: &[PlanDay],
    aggregator: &WeekAggregator,
) -> Result<()> {
    println!("{}", mode_line(tracker));
    let summary = tracker.summary(plan, aggregator);
    for week in &summary.weeks {
        println!("{}: {}/{}", week.label, week.completed, week.total);
    }
    println!(
        "Completed {} of {} days",
        summary.overall_completed, summary.plan_total
    );
    Ok(())
}

async fn connect_auth(db_config: &DbConfig) -> Result<(AuthService, PgPool)> {
    let db_pool = pool::create_pool(db_config).await?;
    let store: Arc<dyn TrackerStore> = Arc::new(PgStore::new(db_pool.clone()));
    Ok((AuthService::new(store, SessionConfig::default()), db_pool))
}

/// `stride signup`: create an account and keep its session on this device.
pub async fn run_signup(
    db_config: &DbConfig,
    paths: &TrackPaths,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<()> {
    let (auth, db_pool) = connect_auth(db_config).await?;
    let result = auth.sign_up(email, password, display_name).await;
    db_pool.close().await;
    let signed = result?;

    config::write_private(&paths.session_file, &signed.token)?;
    info!(user_id = %signed.user.id, "session stored");
    println!("Account created. Signed in as {}.", signed.user.email);
    Ok(())
}

/// `stride login`: sign in and keep the session on this device.
pub async fn run_login(
    db_config: &DbConfig,
    paths: &TrackPaths,
    email: &str,
    password: &str,
) -> Result<()> {
    let (auth, db_pool) = connect_auth(db_config).await?;
    let result = auth.sign_in(email, password).await;
    db_pool.close().await;
    let signed = result?;

    config::write_private(&paths.session_file, &signed.token)?;
    info!(user_id = %signed.user.id, "session stored");
    println!("Signed in as {}.", signed.user.email);
    Ok(())
}

/// `stride logout`: end the session and return to guest data.
pub async fn run_logout(tracker: &mut Tracker<JsonFileStore>, paths: &TrackPaths) -> Result<()> {
    if tracker.state().is_signed_in() {
        tracker.sign_out().await?;
    }
    match std::fs::remove_file(&paths.session_file) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| {
                format!("failed to remove session file {}", paths.session_file.display())
            });
        }
    }
    println!("Signed out.");
    println!("{}", mode_line(tracker));
    Ok(())
}
