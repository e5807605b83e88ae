use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{AcademicRecord, StudentProfile, SurveyResponse};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let profiles = vec![
        (
            Uuid::parse_str("6f1c2b6e-9a07-4f55-8c93-0b1d2c3e4f5a")?,
            "Avery Lee",
            "avery.lee@campus.example",
            Some(20),
            Some("Yes"),
            Some(3.4),
            Some(4.0),
            Some(3.8),
        ),
        (
            Uuid::parse_str("2b9d8c71-44e0-4c2a-b7a3-51f6c0d9e8a1")?,
            "Jules Moreno",
            "jules.moreno@campus.example",
            Some(22),
            Some("No"),
            Some(2.8),
            Some(3.0),
            Some(2.2),
        ),
        (
            Uuid::parse_str("a3c4d5e6-f708-49b1-92c3-d4e5f6a7b8c9")?,
            "Kiara Patel",
            "kiara.patel@campus.example",
            None,
            None,
            None,
            None,
            None,
        ),
    ];

    for (id, name, email, age, diagnosis, awareness, pressure, symptoms) in profiles {
        sqlx::query(
            r#"
            INSERT INTO wellness_study.student_profiles
            (id, full_name, email, age, clinical_diagnosis,
             awareness_score, pressure_score, symptoms_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                age = EXCLUDED.age,
                clinical_diagnosis = EXCLUDED.clinical_diagnosis,
                awareness_score = EXCLUDED.awareness_score,
                pressure_score = EXCLUDED.pressure_score,
                symptoms_score = EXCLUDED.symptoms_score
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(age)
        .bind(diagnosis)
        .bind(awareness)
        .bind(pressure)
        .bind(symptoms)
        .execute(pool)
        .await?;
    }

    let academics = vec![
        (
            Uuid::parse_str("0d1e2f3a-4b5c-4d6e-8f90-a1b2c3d4e5f6")?,
            "avery.lee@campus.example",
            "2025 - Fall - Midterm",
            Some(3.2),
            Some(88.0),
            Some(14.0),
        ),
        (
            Uuid::parse_str("1e2f3a4b-5c6d-4e7f-9012-b3c4d5e6f7a8")?,
            "jules.moreno@campus.example",
            "2025 - Fall - Midterm",
            Some(3.7),
            Some(95.0),
            Some(10.0),
        ),
    ];

    for (id, email, term, gpa, attendance, study_hours) in academics {
        let profile_id: Uuid =
            sqlx::query("SELECT id FROM wellness_study.student_profiles WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO wellness_study.academic_records
            (id, profile_id, term, gpa, attendance_percent, study_hours_per_week)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(profile_id)
        .bind(term)
        .bind(gpa)
        .bind(attendance)
        .bind(study_hours)
        .execute(pool)
        .await?;
    }

    let surveys = vec![
        (
            "seed-001",
            "avery.lee@campus.example",
            NaiveDate::from_ymd_opt(2026, 1, 12).context("invalid date")?,
            Some(4),
            Some(3),
            Some(2),
            Some(4),
            "Midterm week, sleeping badly",
        ),
        (
            "seed-002",
            "jules.moreno@campus.example",
            NaiveDate::from_ymd_opt(2026, 1, 30).context("invalid date")?,
            Some(2),
            Some(2),
            Some(4),
            Some(3),
            "Feeling steady",
        ),
        (
            "seed-003",
            "avery.lee@campus.example",
            NaiveDate::from_ymd_opt(2026, 2, 9).context("invalid date")?,
            Some(5),
            None,
            Some(2),
            Some(5),
            "Skipped the mood question",
        ),
    ];

    for (source_key, email, date, fatigue, mood, sleep, stress, notes) in surveys {
        let profile_id: Uuid =
            sqlx::query("SELECT id FROM wellness_study.student_profiles WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO wellness_study.survey_responses
            (id, profile_id, taken_at, fatigue, mood_swings, sleep_quality,
             academic_stress, headache, appetite_change, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(date.and_hms_opt(9, 0, 0).context("invalid time")?)
        .bind(fatigue)
        .bind(mood)
        .bind(sleep)
        .bind(stress)
        .bind(false)
        .bind(false)
        .bind(notes)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_profiles(pool: &PgPool) -> anyhow::Result<Vec<StudentProfile>> {
    let rows = sqlx::query(
        "SELECT id, full_name, email, age, clinical_diagnosis, \
         awareness_score, pressure_score, symptoms_score \
         FROM wellness_study.student_profiles \
         ORDER BY full_name",
    )
    .fetch_all(pool)
    .await?;

    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(StudentProfile {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            age: row.get("age"),
            clinical_diagnosis: row.get("clinical_diagnosis"),
            awareness_score: row.get("awareness_score"),
            pressure_score: row.get("pressure_score"),
            symptoms_score: row.get("symptoms_score"),
        });
    }

    Ok(profiles)
}

pub async fn fetch_academic_records(pool: &PgPool) -> anyhow::Result<Vec<AcademicRecord>> {
    let rows = sqlx::query(
        "SELECT profile_id, term, gpa, attendance_percent, study_hours_per_week, created_at \
         FROM wellness_study.academic_records \
         ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(AcademicRecord {
            profile_id: row.get("profile_id"),
            term: row.get("term"),
            gpa: row.get("gpa"),
            attendance_percent: row.get("attendance_percent"),
            study_hours_per_week: row.get("study_hours_per_week"),
            created_at: row.get("created_at"),
        });
    }

    Ok(records)
}

pub async fn fetch_survey_responses(pool: &PgPool) -> anyhow::Result<Vec<SurveyResponse>> {
    let rows = sqlx::query(
        "SELECT profile_id, taken_at, fatigue, mood_swings, sleep_quality, \
         academic_stress, headache, appetite_change, notes \
         FROM wellness_study.survey_responses \
         ORDER BY taken_at",
    )
    .fetch_all(pool)
    .await?;

    let mut responses = Vec::new();
    for row in rows {
        responses.push(SurveyResponse {
            profile_id: row.get("profile_id"),
            taken_at: row.get("taken_at"),
            fatigue: row.get("fatigue"),
            mood_swings: row.get("mood_swings"),
            sleep_quality: row.get("sleep_quality"),
            academic_stress: row.get("academic_stress"),
            headache: row.get("headache"),
            appetite_change: row.get("appetite_change"),
            notes: row.get("notes"),
        });
    }

    Ok(responses)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        taken_at: NaiveDateTime,
        fatigue: Option<i32>,
        mood_swings: Option<i32>,
        sleep_quality: Option<i32>,
        academic_stress: Option<i32>,
        headache: bool,
        appetite_change: bool,
        notes: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let profile_id: Uuid = sqlx::query(
            r#"
            INSERT INTO wellness_study.student_profiles (id, full_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO wellness_study.survey_responses
            (id, profile_id, taken_at, fatigue, mood_swings, sleep_quality,
             academic_stress, headache, appetite_change, notes, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(row.taken_at)
        .bind(row.fatigue)
        .bind(row.mood_swings)
        .bind(row.sleep_quality)
        .bind(row.academic_stress)
        .bind(row.headache)
        .bind(row.appetite_change)
        .bind(&row.notes)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn export_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Serialize)]
    struct CsvRow {
        email: String,
        taken_at: NaiveDateTime,
        fatigue: Option<i32>,
        mood_swings: Option<i32>,
        sleep_quality: Option<i32>,
        academic_stress: Option<i32>,
        headache: bool,
        appetite_change: bool,
        notes: Option<String>,
    }

    let rows = sqlx::query(
        "SELECT p.email, s.taken_at, s.fatigue, s.mood_swings, s.sleep_quality, \
         s.academic_stress, s.headache, s.appetite_change, s.notes \
         FROM wellness_study.survey_responses s \
         JOIN wellness_study.student_profiles p ON p.id = s.profile_id \
         ORDER BY s.taken_at",
    )
    .fetch_all(pool)
    .await?;

    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut exported = 0usize;

    for row in rows {
        writer.serialize(CsvRow {
            email: row.get("email"),
            taken_at: row.get("taken_at"),
            fatigue: row.get("fatigue"),
            mood_swings: row.get("mood_swings"),
            sleep_quality: row.get("sleep_quality"),
            academic_stress: row.get("academic_stress"),
            headache: row.get("headache"),
            appetite_change: row.get("appetite_change"),
            notes: row.get("notes"),
        })?;
        exported += 1;
    }
    writer.flush()?;

    Ok(exported)
}
