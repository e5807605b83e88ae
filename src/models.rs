use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub clinical_diagnosis: Option<String>,
    pub awareness_score: Option<f64>,
    pub pressure_score: Option<f64>,
    pub symptoms_score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AcademicRecord {
    pub profile_id: Uuid,
    pub term: String,
    pub gpa: Option<f64>,
    pub attendance_percent: Option<f64>,
    pub study_hours_per_week: Option<f64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct SurveyResponse {
    pub profile_id: Uuid,
    pub taken_at: NaiveDateTime,
    pub fatigue: Option<i32>,
    pub mood_swings: Option<i32>,
    pub sleep_quality: Option<i32>,
    pub academic_stress: Option<i32>,
    pub headache: bool,
    pub appetite_change: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationSummary {
    pub total_students: usize,
    pub total_academic_records: usize,
    pub total_surveys: usize,
    pub diagnosis_breakdown: BTreeMap<String, usize>,
    pub avg_age: Option<f64>,
    pub avg_awareness_score: Option<f64>,
    pub avg_pressure_score: Option<f64>,
    pub avg_symptoms_score: Option<f64>,
    pub generated_at: String,
}

/// The four variable pairs the study tracks, in report-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPair {
    SymptomsVsPressure,
    SymptomsVsGpa,
    PressureVsGpa,
    FatigueVsAttendance,
}

impl CorrelationPair {
    pub fn label(self) -> &'static str {
        match self {
            CorrelationPair::SymptomsVsPressure => "Symptoms vs Academic Pressure",
            CorrelationPair::SymptomsVsGpa => "Symptoms vs GPA",
            CorrelationPair::PressureVsGpa => "Academic Pressure vs GPA",
            CorrelationPair::FatigueVsAttendance => "Fatigue vs Attendance",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    pub pair: CorrelationPair,
    pub coefficient: f64,
    pub p_value: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisGroupStats {
    pub count: usize,
    pub avg_awareness: Option<f64>,
    pub avg_pressure: Option<f64>,
    pub avg_symptoms: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrend {
    pub avg_fatigue: Option<f64>,
    pub avg_mood: Option<f64>,
    pub avg_sleep: Option<f64>,
    pub avg_stress: Option<f64>,
}

/// Everything a rendered report needs, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub summary: PopulationSummary,
    pub correlations: Vec<Correlation>,
    pub diagnosis_comparison: BTreeMap<String, DiagnosisGroupStats>,
    pub time_trends: Option<BTreeMap<String, MonthlyTrend>>,
    pub key_findings: Vec<String>,
}
