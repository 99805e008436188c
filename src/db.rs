use std::collections::BTreeSet;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::effort::EffortCalculator;
use crate::models::{
    Athlete, AttendanceRecord, AttendanceRow, EvaluationEvent, Fundamento, JustificationType,
};
use crate::ranking::RankingWindow;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_athlete(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    team: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO squad_pulse.athletes (id, full_name, email, team)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, team = EXCLUDED.team
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(team)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn insert_attendance(
    pool: &PgPool,
    athlete_id: Uuid,
    session_date: NaiveDate,
    present: bool,
    justification: JustificationType,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO squad_pulse.attendance
        (id, athlete_id, session_date, present, justification, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(athlete_id)
    .bind(session_date)
    .bind(present)
    .bind(justification.as_str())
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_evaluation(
    pool: &PgPool,
    athlete_id: Uuid,
    fundamento: Fundamento,
    weight: f64,
    recorded_at: DateTime<Utc>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO squad_pulse.evaluations
        (id, athlete_id, fundamento, weight, recorded_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(athlete_id)
    .bind(fundamento.as_str())
    .bind(weight)
    .bind(recorded_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool, calculator: EffortCalculator) -> anyhow::Result<()> {
    let roster = [
        ("Ana Souza", "ana.souza@squadpulse.dev", "sub-17"),
        ("Bruna Lima", "bruna.lima@squadpulse.dev", "sub-17"),
        ("Carla Mendes", "carla.mendes@squadpulse.dev", "sub-17"),
        ("Duda Rocha", "duda.rocha@squadpulse.dev", "sub-17"),
        ("Eva Martins", "eva.martins@squadpulse.dev", "sub-17"),
    ];

    // Per-athlete session outcomes, most recent last. `None` means present.
    let absences: [&[Option<JustificationType>]; 5] = [
        &[None; 10],
        &[
            None,
            None,
            Some(JustificationType::Logistic),
            None,
            None,
            Some(JustificationType::Academic),
            None,
            None,
            None,
            None,
        ],
        &[
            Some(JustificationType::None),
            None,
            Some(JustificationType::None),
            None,
            Some(JustificationType::Health),
            None,
            None,
            Some(JustificationType::None),
            None,
            None,
        ],
        &[None, Some(JustificationType::Personal), None, None],
        &[],
    ];

    let weights: [&[f64]; 5] = [
        &[3.0, 2.0, 3.0, 1.0, 2.0, -1.0, 3.0],
        &[1.0, 2.0, -1.0, 2.0, 1.0, 0.0],
        &[-2.0, 1.0, 3.0, -3.0, 2.0, 1.0, 1.0, 0.0],
        &[3.0, 3.0, -3.0, -3.0],
        &[2.0, 1.0, 2.0, 3.0, 1.0],
    ];

    let first_session = NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?;
    let first_evaluation = Utc
        .with_ymd_and_hms(2026, 2, 2, 18, 0, 0)
        .single()
        .context("invalid timestamp")?;

    for (index, (name, email, team)) in roster.iter().enumerate() {
        let athlete_id = upsert_athlete(pool, name, email, team).await?;

        for (session, outcome) in absences[index].iter().enumerate() {
            let session_date = first_session + Duration::days(2 * session as i64);
            insert_attendance(
                pool,
                athlete_id,
                session_date,
                outcome.is_none(),
                outcome.unwrap_or_default(),
                &format!("seed-att-{email}-{session_date}"),
            )
            .await?;
        }

        for fundamento in [Fundamento::Serve, Fundamento::Attack, Fundamento::Reception] {
            for (attempt, weight) in weights[index].iter().enumerate() {
                let recorded_at = first_evaluation + Duration::minutes(attempt as i64);
                insert_evaluation(
                    pool,
                    athlete_id,
                    fundamento,
                    *weight,
                    recorded_at,
                    &format!("seed-eval-{email}-{fundamento}-{attempt}"),
                )
                .await?;
            }
        }

        refresh_effort_index(pool, athlete_id, calculator).await?;
        debug!(athlete = %name, "seeded athlete");
    }

    info!(athletes = roster.len(), "seed complete");
    Ok(())
}

pub async fn fetch_team_athletes(pool: &PgPool, team: &str) -> anyhow::Result<Vec<Athlete>> {
    let rows = sqlx::query(
        r#"
        SELECT id, full_name, email, team
        FROM squad_pulse.athletes
        WHERE team = $1
        ORDER BY full_name
        "#,
    )
    .bind(team)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Athlete {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            team: row.get("team"),
        })
        .collect())
}

/// Most recent sessions first, at most `limit` rows.
pub async fn fetch_recent_attendance(
    pool: &PgPool,
    athlete_id: Uuid,
    limit: usize,
) -> anyhow::Result<Vec<AttendanceRow>> {
    let rows = sqlx::query(
        r#"
        SELECT athlete_id, session_date, present, justification
        FROM squad_pulse.attendance
        WHERE athlete_id = $1
        ORDER BY session_date DESC
        LIMIT $2
        "#,
    )
    .bind(athlete_id)
    .bind(i64::try_from(limit).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let justification: String = row.get("justification");
        records.push(AttendanceRow {
            athlete_id: row.get("athlete_id"),
            session_date: row.get("session_date"),
            present: row.get("present"),
            justification: justification.parse()?,
        });
    }

    Ok(records)
}

pub async fn fetch_evaluations(
    pool: &PgPool,
    team: &str,
    fundamento: Fundamento,
    window: Option<RankingWindow>,
) -> anyhow::Result<Vec<EvaluationEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT a.id AS athlete_id, a.full_name, a.team, e.fundamento, e.weight, e.recorded_at
        FROM squad_pulse.evaluations e
        JOIN squad_pulse.athletes a ON a.id = e.athlete_id
        WHERE a.team = $1
          AND e.fundamento = $2
          AND ($3::timestamptz IS NULL OR e.recorded_at >= $3)
          AND ($4::timestamptz IS NULL OR e.recorded_at <= $4)
        ORDER BY e.recorded_at, e.id
        "#,
    )
    .bind(team)
    .bind(fundamento.as_str())
    .bind(window.map(|w| w.start))
    .bind(window.map(|w| w.end))
    .fetch_all(pool)
    .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        let fundamento: String = row.get("fundamento");
        events.push(EvaluationEvent {
            athlete_id: row.get("athlete_id"),
            athlete_name: row.get("full_name"),
            team: row.get("team"),
            fundamento: fundamento.parse()?,
            weight: row.get("weight"),
            recorded_at: row.get("recorded_at"),
        });
    }

    debug!(team, %fundamento, events = events.len(), "fetched evaluations");
    Ok(events)
}

/// Persist a recomputed index onto the athlete profile. `None` clears it.
pub async fn store_effort_index(
    pool: &PgPool,
    athlete_id: Uuid,
    effort_index: Option<f64>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE squad_pulse.athletes
        SET effort_index = $2, effort_updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(athlete_id)
    .bind(effort_index)
    .execute(pool)
    .await?;

    Ok(())
}

/// Recompute an athlete's index from their latest sessions and store it.
pub async fn refresh_effort_index(
    pool: &PgPool,
    athlete_id: Uuid,
    calculator: EffortCalculator,
) -> anyhow::Result<Option<f64>> {
    let rows = fetch_recent_attendance(pool, athlete_id, calculator.window()).await?;
    let records: Vec<AttendanceRecord> = rows.iter().map(AttendanceRecord::from).collect();
    let effort_index = calculator.stored_index(&records);

    store_effort_index(pool, athlete_id, effort_index).await?;
    debug!(%athlete_id, ?effort_index, "effort index refreshed");
    Ok(effort_index)
}

/// Inserts new sessions, then refreshes the stored index of every athlete that gained one.
pub async fn import_attendance_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    calculator: EffortCalculator,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        team: String,
        session_date: NaiveDate,
        present: bool,
        justification: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut touched = BTreeSet::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let justification: JustificationType =
            row.justification.as_deref().unwrap_or_default().parse()?;
        if row.present && justification != JustificationType::None {
            warn!(
                email = %row.email,
                date = %row.session_date,
                "justification ignored on a present record"
            );
        }

        let athlete_id = upsert_athlete(pool, &row.full_name, &row.email, &row.team).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-att-{}-{}", row.email, row.session_date));

        if insert_attendance(
            pool,
            athlete_id,
            row.session_date,
            row.present,
            justification,
            &source_key,
        )
        .await?
        {
            inserted += 1;
            touched.insert(athlete_id);
        }
    }

    for athlete_id in touched.iter() {
        refresh_effort_index(pool, *athlete_id, calculator).await?;
    }

    info!(
        inserted,
        refreshed = touched.len(),
        path = %csv_path.display(),
        "attendance import finished"
    );
    Ok(inserted)
}

/// Rows whose weight falls outside `±weight_bound` are rejected before anything is written.
pub async fn import_evaluations_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    weight_bound: f64,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        team: String,
        fundamento: String,
        weight: f64,
        recorded_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut rows = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        if !row.weight.is_finite() || row.weight.abs() > weight_bound {
            bail!(
                "row {}: weight {} for {} is outside ±{}",
                line + 1,
                row.weight,
                row.email,
                weight_bound
            );
        }
        let fundamento: Fundamento = row
            .fundamento
            .parse()
            .with_context(|| format!("row {}", line + 1))?;
        rows.push((row, fundamento));
    }

    let mut inserted = 0usize;
    for (row, fundamento) in rows {
        let athlete_id = upsert_athlete(pool, &row.full_name, &row.email, &row.team).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-eval-{}", Uuid::new_v4()));

        if insert_evaluation(
            pool,
            athlete_id,
            fundamento,
            row.weight,
            row.recorded_at,
            &source_key,
        )
        .await?
        {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "evaluation import finished");
    Ok(inserted)
}
