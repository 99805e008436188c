use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use squad_pulse::config::AppConfig;
use squad_pulse::models::{AthleteEffort, AttendanceRecord, Fundamento};
use squad_pulse::{
    compute_fundamento_ranking, db, report, telemetry, EffortCalculator, RankingWindow,
};

#[derive(Parser)]
#[command(name = "squad-pulse")]
#[command(about = "Attendance effort and fundamento rankings for volleyball squads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample roster with attendance and evaluations
    Seed,
    /// Import attendance records from a CSV file
    ImportAttendance {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import evaluation events from a CSV file
    ImportEvaluations {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Recompute the attendance effort index for a team
    Effort {
        #[arg(long)]
        team: String,
        /// Store the recomputed index on each athlete profile
        #[arg(long)]
        persist: bool,
    },
    /// Rank a team's athletes in one fundamento
    Ranking {
        #[arg(long)]
        team: String,
        #[arg(long)]
        fundamento: Fundamento,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        /// Overrides SQUAD_PULSE_MIN_ATTEMPTS
        #[arg(long)]
        min_attempts: Option<usize>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        team: String,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

async fn team_efforts(
    pool: &PgPool,
    team: &str,
    calculator: EffortCalculator,
) -> anyhow::Result<Vec<AthleteEffort>> {
    let athletes = db::fetch_team_athletes(pool, team).await?;
    let mut efforts = Vec::with_capacity(athletes.len());

    for athlete in athletes {
        let rows = db::fetch_recent_attendance(pool, athlete.id, calculator.window()).await?;
        let records: Vec<AttendanceRecord> = rows.iter().map(AttendanceRecord::from).collect();
        let effort_index = calculator.stored_index(&records);

        efforts.push(AthleteEffort {
            athlete_id: athlete.id,
            name: athlete.full_name,
            sessions: records.len(),
            effort_index,
        });
    }

    Ok(efforts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.log_level)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(config.database.url()?)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool, config.scoring.effort_calculator()).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportAttendance { csv } => {
            let inserted =
                db::import_attendance_csv(&pool, &csv, config.scoring.effort_calculator())
                    .await?;
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
        Commands::ImportEvaluations { csv } => {
            let inserted =
                db::import_evaluations_csv(&pool, &csv, config.scoring.weight_bound).await?;
            println!("Inserted {inserted} evaluations from {}.", csv.display());
        }
        Commands::Effort { team, persist } => {
            let mut efforts =
                team_efforts(&pool, &team, config.scoring.effort_calculator()).await?;

            if efforts.is_empty() {
                println!("No athletes registered for {team}.");
                return Ok(());
            }

            if persist {
                for effort in efforts.iter() {
                    db::store_effort_index(&pool, effort.athlete_id, effort.effort_index).await?;
                }
                info!(team = %team, athletes = efforts.len(), "effort indexes persisted");
            }

            report::sort_efforts(&mut efforts);
            println!("Effort index for {team}:");
            for effort in efforts.iter() {
                match effort.effort_index {
                    Some(index) => println!(
                        "- {} {:+.2} ({}) over {} sessions",
                        effort.name,
                        index,
                        report::effort_label(index),
                        effort.sessions
                    ),
                    None => println!("- {} no attendance data", effort.name),
                }
            }
        }
        Commands::Ranking {
            team,
            fundamento,
            since_days,
            min_attempts,
            top,
            json,
        } => {
            let window = RankingWindow::trailing_days(since_days, Utc::now());
            let events = db::fetch_evaluations(&pool, &team, fundamento, Some(window)).await?;

            let mut options = config.scoring.ranking_options();
            options.window = Some(window);
            options.top_k = top;
            if let Some(min_attempts) = min_attempts {
                options.minimum_attempts = min_attempts;
            }

            let ranking = compute_fundamento_ranking(&events, &options);

            if json {
                println!("{}", serde_json::to_string_pretty(&ranking)?);
                return Ok(());
            }

            if ranking.is_empty() {
                println!(
                    "Not enough data: no athlete has {} or more {fundamento} evaluations.",
                    options.minimum_attempts
                );
                return Ok(());
            }

            println!("{fundamento} ranking for {team}:");
            for entry in ranking.iter() {
                println!("{}", report::format_ranking_line(entry));
            }
        }
        Commands::Report {
            team,
            since_days,
            out,
        } => {
            let window = RankingWindow::trailing_days(since_days, Utc::now());
            let efforts = team_efforts(&pool, &team, config.scoring.effort_calculator()).await?;
            if efforts.is_empty() {
                warn!(team = %team, "report generated for a team with no athletes");
            }

            let mut options = config.scoring.ranking_options();
            options.window = Some(window);
            options.top_k = Some(report::REPORT_TOP_K);

            let mut rankings = Vec::with_capacity(Fundamento::ALL.len());
            for fundamento in Fundamento::ALL {
                let events = db::fetch_evaluations(&pool, &team, fundamento, Some(window)).await?;
                rankings.push((fundamento, compute_fundamento_ranking(&events, &options)));
            }

            let report =
                report::build_report(&team, window.start.date_naive(), &efforts, &rankings);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
