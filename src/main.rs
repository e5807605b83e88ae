use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod models;
mod pdf;
mod report;
mod stats;

use models::{AcademicRecord, StudentProfile, SurveyResponse};
use pdf::fmt_opt;

#[derive(Parser)]
#[command(name = "wellness-study")]
#[command(about = "Survey analytics and research reporting for the campus wellness study", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic sample data
    Seed,
    /// Import survey responses from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export all survey responses to a CSV file
    Export {
        #[arg(long, default_value = "survey_responses.csv")]
        out: PathBuf,
    },
    /// Print the population summary
    Summary,
    /// Print the full report structure as JSON
    Preview,
    /// Generate the research report PDF
    Report {
        #[arg(long, default_value = "research_report.pdf")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} survey responses from {}.", csv.display());
        }
        Commands::Export { out } => {
            let exported = db::export_csv(&pool, &out).await?;
            println!("Exported {exported} survey responses to {}.", out.display());
        }
        Commands::Summary => {
            let (profiles, academics, surveys) = fetch_snapshot(&pool).await?;
            let summary = report::population_summary(&profiles, &academics, &surveys);

            println!("Population summary ({}):", summary.generated_at);
            println!("- Students: {}", summary.total_students);
            println!("- Academic records: {}", summary.total_academic_records);
            println!("- Survey responses: {}", summary.total_surveys);
            println!("- Average age: {}", fmt_opt(summary.avg_age));
            println!("- Avg awareness score: {}", fmt_opt(summary.avg_awareness_score));
            println!("- Avg pressure score: {}", fmt_opt(summary.avg_pressure_score));
            println!("- Avg symptoms score: {}", fmt_opt(summary.avg_symptoms_score));
            for (diagnosis, count) in &summary.diagnosis_breakdown {
                println!("- Diagnosis \"{diagnosis}\": {count} students");
            }
        }
        Commands::Preview => {
            let (profiles, academics, surveys) = fetch_snapshot(&pool).await?;
            let data = report::build_report(&profiles, &academics, &surveys);
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Report { out } => {
            let (profiles, academics, surveys) = fetch_snapshot(&pool).await?;
            let data = report::build_report(&profiles, &academics, &surveys);
            pdf::write_pdf(&data, &out)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn fetch_snapshot(
    pool: &PgPool,
) -> anyhow::Result<(Vec<StudentProfile>, Vec<AcademicRecord>, Vec<SurveyResponse>)> {
    let profiles = db::fetch_profiles(pool).await?;
    let academics = db::fetch_academic_records(pool).await?;
    let surveys = db::fetch_survey_responses(pool).await?;
    Ok((profiles, academics, surveys))
}
