mod config;
mod plan_cmd;
mod serve_cmd;
mod track_cmd;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use stride_core::auth::SessionConfig;
use stride_core::plan::load_plan;
use stride_core::progress::WeekAggregator;
use stride_core::store::{MemoryStore, TrackerStore};
use stride_db::config::DbConfig;
use stride_db::{PgStore, pool};

use config::StrideConfig;
use track_cmd::TrackPaths;

#[derive(Parser)]
#[command(name = "stride", about = "Workout plan viewer and progress tracker")]
struct Cli {
    /// Database URL (overrides STRIDE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Guest data file (defaults to ~/.local/share/stride/guest.json)
    #[arg(long, global = true)]
    guest_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a stride config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Default plan CSV path
        #[arg(long)]
        plan: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the stride database
    DbInit,
    /// Plan viewing
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Toggle a day's done flag
    Done {
        /// Day identifier (`<date>-<day>`, e.g. "Jan 5-Mon")
        day_id: String,
        /// Plan CSV used to check the day exists
        #[arg(long)]
        plan: Option<String>,
    },
    /// Record body measurements for a week
    Measure {
        /// 1-based week index
        #[arg(long)]
        week: i64,
        /// Values as field=value (e.g. weight=70 chestBust=96)
        values: Vec<String>,
    },
    /// Show sync mode and weekly progress
    Status {
        /// Plan CSV path
        #[arg(long)]
        plan: Option<String>,
        /// Days per week when grouping the plan
        #[arg(long, default_value = "7")]
        days_per_week: NonZeroUsize,
    },
    /// Create an account and sign in on this device
    Signup {
        email: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
        /// Password (falls back to STRIDE_PASSWORD, then stdin)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in on this device
    Login {
        email: String,
        /// Password (falls back to STRIDE_PASSWORD, then stdin)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and return to guest data
    Logout,
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Plan CSV path
        #[arg(long)]
        plan: Option<String>,
        /// Keep accounts and progress in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Print the plan grouped into weeks
    Show {
        /// Plan CSV path (defaults to the configured plan)
        csv: Option<String>,
        /// Show one week in full (1-based)
        #[arg(long)]
        week: Option<usize>,
        /// Days per week when grouping the plan
        #[arg(long, default_value = "7")]
        days_per_week: NonZeroUsize,
    },
}

/// Execute the `stride init` command: write config file.
fn cmd_init(db_url: &str, plan: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut server = config::ServerSection::default();
    if let Some(plan) = plan {
        server.plan_path = plan.to_owned();
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        server,
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server.plan_path = {}", cfg.server.plan_path);
    println!();
    println!("Next: run `stride db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `stride db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = StrideConfig::resolve(cli_db_url, None)?;

    println!("Initializing stride database...");

    let db_pool = pool::prepare_database(&resolved.db_config).await?;
    let counts = pool::table_counts(&db_pool).await;
    db_pool.close().await;
    let counts = counts?;

    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }
    println!("stride db-init complete.");
    Ok(())
}

/// Password from the flag, then `STRIDE_PASSWORD`, then one line of stdin.
fn read_password(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("STRIDE_PASSWORD") {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn cmd_serve(
    resolved: StrideConfig,
    bind: Option<String>,
    port: Option<u16>,
    memory: bool,
) -> anyhow::Result<()> {
    let plan = load_plan(&resolved.plan_path);
    tracing::info!(
        path = %resolved.plan_path.display(),
        days = plan.len(),
        "plan loaded"
    );

    let session = SessionConfig {
        secure: resolved.server.secure_cookies,
        ..SessionConfig::default()
    };
    let bind = bind.unwrap_or_else(|| resolved.server.bind.clone());
    let port = port.unwrap_or(resolved.server.port);

    if memory {
        tracing::warn!("using in-memory storage; accounts and progress are lost on exit");
        let store: Arc<dyn TrackerStore> = Arc::new(MemoryStore::new());
        let state = serve_cmd::AppState::new(store, plan, session);
        return serve_cmd::run_serve(state, &bind, port).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    if let Err(e) = pool::purge_expired_sessions(&db_pool).await {
        tracing::warn!(error = %e, "could not purge expired sessions");
    }
    let store: Arc<dyn TrackerStore> = Arc::new(PgStore::new(db_pool.clone()));
    let state = serve_cmd::AppState::new(store, plan, session);
    let result = serve_cmd::run_serve(state, &bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = TrackPaths::new(cli.guest_file.clone());

    match cli.command {
        Commands::Init { db_url, plan, force } => {
            cmd_init(&db_url, plan.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Plan {
            command:
                PlanCommands::Show {
                    csv,
                    week,
                    days_per_week,
                },
        } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), csv.as_deref())?;
            let open = track_cmd::open_tracker(&paths, &resolved.db_config).await?;
            let result = plan_cmd::run_plan_show(
                &resolved.plan_path,
                open.tracker.completions(),
                &WeekAggregator::new(days_per_week),
                week,
            );
            open.close().await;
            result?;
        }
        Commands::Done { day_id, plan } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), plan.as_deref())?;
            // The plan is only used to warn about unknown ids.
            let plan_days = load_plan(&resolved.plan_path);
            let known = (!plan_days.is_empty()).then_some(plan_days.as_slice());
            let mut open = track_cmd::open_tracker(&paths, &resolved.db_config).await?;
            let result = track_cmd::run_done(&mut open.tracker, &day_id, known).await;
            open.close().await;
            result?;
        }
        Commands::Measure { week, values } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), None)?;
            let mut open = track_cmd::open_tracker(&paths, &resolved.db_config).await?;
            let result = track_cmd::run_measure(&mut open.tracker, week, &values).await;
            open.close().await;
            result?;
        }
        Commands::Status {
            plan,
            days_per_week,
        } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), plan.as_deref())?;
            let plan_days = load_plan(&resolved.plan_path);
            let open = track_cmd::open_tracker(&paths, &resolved.db_config).await?;
            let result = track_cmd::run_status(
                &open.tracker,
                &plan_days,
                &WeekAggregator::new(days_per_week),
            );
            open.close().await;
            result?;
        }
        Commands::Signup {
            email,
            name,
            password,
        } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), None)?;
            let password = read_password(password)?;
            track_cmd::run_signup(&resolved.db_config, &paths, &email, &password, &name).await?;
        }
        Commands::Login { email, password } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), None)?;
            let password = read_password(password)?;
            track_cmd::run_login(&resolved.db_config, &paths, &email, &password).await?;
        }
        Commands::Logout => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), None)?;
            let mut open = track_cmd::open_tracker(&paths, &resolved.db_config).await?;
            let result = track_cmd::run_logout(&mut open.tracker, &paths).await;
            open.close().await;
            result?;
        }
        Commands::Serve {
            bind,
            port,
            plan,
            memory,
        } => {
            let resolved = StrideConfig::resolve(cli.database_url.as_deref(), plan.as_deref())?;
            cmd_serve(resolved, bind, port, memory).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that touch process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    const VARS: [&str; 4] = [
        "XDG_CONFIG_HOME",
        "XDG_DATA_HOME",
        "STRIDE_DATABASE_URL",
        "STRIDE_PLAN_PATH",
    ];

    /// Run `f` with config and data dirs pointed at a fresh temp dir and
    /// the stride env vars cleared. Callers must hold [`lock_env`].
    pub fn with_temp_config_home<F: FnOnce()>(f: F) {
        let tmp = tempfile::TempDir::new().unwrap();
        let saved: Vec<(&str, Option<String>)> =
            VARS.iter().map(|&var| (var, std::env::var(var).ok())).collect();

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", tmp.path().join("config"));
            std::env::set_var("XDG_DATA_HOME", tmp.path().join("data"));
            std::env::remove_var("STRIDE_DATABASE_URL");
            std::env::remove_var("STRIDE_PLAN_PATH");
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        for (var, value) in saved {
            match value {
                Some(value) => unsafe { std::env::set_var(var, value) },
                None => unsafe { std::env::remove_var(var) },
            }
        }

        if let Err(panic) = result {
            std::panic::resume_unwind(panic);
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stride",
            "measure",
            "--week",
            "2",
            "weight=70",
            "--guest-file",
            "/tmp/g.json",
        ])
        .unwrap();
        assert_eq!(cli.guest_file, Some(PathBuf::from("/tmp/g.json")));
        match cli.command {
            Commands::Measure { week, values } => {
                assert_eq!(week, 2);
                assert_eq!(values, vec!["weight=70".to_owned()]);
            }
            _ => panic!("expected measure"),
        }
    }

    #[test]
    fn plan_show_defaults() {
        let cli = Cli::try_parse_from(["stride", "plan", "show"]).unwrap();
        match cli.command {
            Commands::Plan {
                command:
                    PlanCommands::Show {
                        csv,
                        week,
                        days_per_week,
                    },
            } => {
                assert_eq!(csv, None);
                assert_eq!(week, None);
                assert_eq!(days_per_week.get(), 7);
            }
            _ => panic!("expected plan show"),
        }
    }

    #[test]
    fn password_flag_wins() {
        assert_eq!(read_password(Some("secret1".to_owned())).unwrap(), "secret1");
    }
}
