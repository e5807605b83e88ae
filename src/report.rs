use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    AcademicRecord, Correlation, CorrelationPair, DiagnosisGroupStats, MonthlyTrend,
    PopulationSummary, ReportData, StudentProfile, SurveyResponse,
};
use crate::stats;

/// Bucket label for profiles without a recorded diagnosis.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Correlations on fewer paired observations than this are not reported.
const MIN_PAIRED_SAMPLES: usize = 3;

pub fn build_report(
    profiles: &[StudentProfile],
    academics: &[AcademicRecord],
    surveys: &[SurveyResponse],
) -> ReportData {
    let summary = population_summary(profiles, academics, surveys);
    let correlations = correlation_analysis(profiles, academics, surveys);
    let key_findings = key_findings(&summary, &correlations);

    ReportData {
        summary,
        correlations,
        diagnosis_comparison: diagnosis_comparison(profiles),
        time_trends: time_trends(surveys),
        key_findings,
    }
}

pub fn population_summary(
    profiles: &[StudentProfile],
    academics: &[AcademicRecord],
    surveys: &[SurveyResponse],
) -> PopulationSummary {
    let mut diagnosis_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for profile in profiles {
        let diagnosis = profile
            .clinical_diagnosis
            .clone()
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());
        *diagnosis_breakdown.entry(diagnosis).or_insert(0) += 1;
    }

    let ages: Vec<f64> = profiles.iter().filter_map(|p| p.age.map(f64::from)).collect();
    let awareness: Vec<f64> = profiles.iter().filter_map(|p| p.awareness_score).collect();
    let pressure: Vec<f64> = profiles.iter().filter_map(|p| p.pressure_score).collect();
    let symptoms: Vec<f64> = profiles.iter().filter_map(|p| p.symptoms_score).collect();

    PopulationSummary {
        total_students: profiles.len(),
        total_academic_records: academics.len(),
        total_surveys: surveys.len(),
        diagnosis_breakdown,
        avg_age: stats::mean(&ages).map(|v| stats::round_to(v, 1)),
        avg_awareness_score: stats::mean(&awareness).map(|v| stats::round_to(v, 2)),
        avg_pressure_score: stats::mean(&pressure).map(|v| stats::round_to(v, 2)),
        avg_symptoms_score: stats::mean(&symptoms).map(|v| stats::round_to(v, 2)),
        generated_at: Utc::now().format("%B %d, %Y at %H:%M UTC").to_string(),
    }
}

/// One row of study variables per profile. Per-record values are averaged
/// per profile first so every profile contributes at most one observation.
struct VariableRow {
    symptoms: Option<f64>,
    pressure: Option<f64>,
    gpa: Option<f64>,
    attendance: Option<f64>,
    fatigue: Option<f64>,
}

fn variable_rows(
    profiles: &[StudentProfile],
    academics: &[AcademicRecord],
    surveys: &[SurveyResponse],
) -> Vec<VariableRow> {
    let mut gpa_by_profile: HashMap<Uuid, Vec<f64>> = HashMap::new();
    let mut attendance_by_profile: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for record in academics {
        if let Some(gpa) = record.gpa {
            gpa_by_profile.entry(record.profile_id).or_default().push(gpa);
        }
        if let Some(attendance) = record.attendance_percent {
            attendance_by_profile
                .entry(record.profile_id)
                .or_default()
                .push(attendance);
        }
    }

    let mut fatigue_by_profile: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for survey in surveys {
        if let Some(fatigue) = survey.fatigue {
            fatigue_by_profile
                .entry(survey.profile_id)
                .or_default()
                .push(f64::from(fatigue));
        }
    }

    profiles
        .iter()
        .map(|profile| VariableRow {
            symptoms: profile.symptoms_score,
            pressure: profile.pressure_score,
            gpa: gpa_by_profile.get(&profile.id).and_then(|v| stats::mean(v)),
            attendance: attendance_by_profile
                .get(&profile.id)
                .and_then(|v| stats::mean(v)),
            fatigue: fatigue_by_profile
                .get(&profile.id)
                .and_then(|v| stats::mean(v)),
        })
        .collect()
}

/// Row-wise deletion: keep only rows where both variables are present.
fn paired(
    rows: &[VariableRow],
    get_x: fn(&VariableRow) -> Option<f64>,
    get_y: fn(&VariableRow) -> Option<f64>,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in rows {
        if let (Some(x), Some(y)) = (get_x(row), get_y(row)) {
            xs.push(x);
            ys.push(y);
        }
    }
    (xs, ys)
}

pub fn correlation_analysis(
    profiles: &[StudentProfile],
    academics: &[AcademicRecord],
    surveys: &[SurveyResponse],
) -> Vec<Correlation> {
    let rows = variable_rows(profiles, academics, surveys);

    type Getter = fn(&VariableRow) -> Option<f64>;
    let pairs: [(CorrelationPair, Getter, Getter); 4] = [
        (CorrelationPair::SymptomsVsPressure, |r| r.symptoms, |r| r.pressure),
        (CorrelationPair::SymptomsVsGpa, |r| r.symptoms, |r| r.gpa),
        (CorrelationPair::PressureVsGpa, |r| r.pressure, |r| r.gpa),
        (CorrelationPair::FatigueVsAttendance, |r| r.fatigue, |r| r.attendance),
    ];

    let mut correlations = Vec::new();
    for (pair, get_x, get_y) in pairs {
        let (xs, ys) = paired(&rows, get_x, get_y);
        if xs.len() < MIN_PAIRED_SAMPLES {
            continue;
        }
        if let Some((rho, p_value)) = stats::spearman(&xs, &ys) {
            correlations.push(Correlation {
                pair,
                coefficient: stats::round_to(rho, 3),
                p_value: stats::round_to(p_value, 4),
                interpretation: stats::interpret(rho),
            });
        }
    }
    correlations
}

pub fn diagnosis_comparison(profiles: &[StudentProfile]) -> BTreeMap<String, DiagnosisGroupStats> {
    struct Group {
        count: usize,
        awareness: Vec<f64>,
        pressure: Vec<f64>,
        symptoms: Vec<f64>,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for profile in profiles {
        let diagnosis = profile
            .clinical_diagnosis
            .clone()
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());
        let group = groups.entry(diagnosis).or_insert_with(|| Group {
            count: 0,
            awareness: Vec::new(),
            pressure: Vec::new(),
            symptoms: Vec::new(),
        });
        group.count += 1;
        if let Some(score) = profile.awareness_score {
            group.awareness.push(score);
        }
        if let Some(score) = profile.pressure_score {
            group.pressure.push(score);
        }
        if let Some(score) = profile.symptoms_score {
            group.symptoms.push(score);
        }
    }

    groups
        .into_iter()
        .map(|(diagnosis, group)| {
            (
                diagnosis,
                DiagnosisGroupStats {
                    count: group.count,
                    avg_awareness: stats::mean(&group.awareness).map(|v| stats::round_to(v, 2)),
                    avg_pressure: stats::mean(&group.pressure).map(|v| stats::round_to(v, 2)),
                    avg_symptoms: stats::mean(&group.symptoms).map(|v| stats::round_to(v, 2)),
                },
            )
        })
        .collect()
}

/// Monthly survey-metric averages keyed "YYYY-MM". `None` distinguishes "no
/// survey data at all" from a map of real periods.
pub fn time_trends(surveys: &[SurveyResponse]) -> Option<BTreeMap<String, MonthlyTrend>> {
    if surveys.is_empty() {
        return None;
    }

    #[derive(Default)]
    struct Bucket {
        fatigue: Vec<f64>,
        mood: Vec<f64>,
        sleep: Vec<f64>,
        stress: Vec<f64>,
    }

    let mut monthly: BTreeMap<String, Bucket> = BTreeMap::new();
    for survey in surveys {
        let bucket = monthly
            .entry(survey.taken_at.format("%Y-%m").to_string())
            .or_default();
        if let Some(v) = survey.fatigue {
            bucket.fatigue.push(f64::from(v));
        }
        if let Some(v) = survey.mood_swings {
            bucket.mood.push(f64::from(v));
        }
        if let Some(v) = survey.sleep_quality {
            bucket.sleep.push(f64::from(v));
        }
        if let Some(v) = survey.academic_stress {
            bucket.stress.push(f64::from(v));
        }
    }

    Some(
        monthly
            .into_iter()
            .map(|(month, bucket)| {
                (
                    month,
                    MonthlyTrend {
                        avg_fatigue: stats::mean(&bucket.fatigue).map(|v| stats::round_to(v, 2)),
                        avg_mood: stats::mean(&bucket.mood).map(|v| stats::round_to(v, 2)),
                        avg_sleep: stats::mean(&bucket.sleep).map(|v| stats::round_to(v, 2)),
                        avg_stress: stats::mean(&bucket.stress).map(|v| stats::round_to(v, 2)),
                    },
                )
            })
            .collect(),
    )
}

pub fn key_findings(summary: &PopulationSummary, correlations: &[Correlation]) -> Vec<String> {
    let mut findings = Vec::new();

    findings.push(format!(
        "Study includes {} students with {} survey responses collected.",
        summary.total_students, summary.total_surveys
    ));

    let diagnosed = summary.diagnosis_breakdown.get("Yes").copied().unwrap_or(0);
    if diagnosed > 0 && summary.total_students > 0 {
        let pct = stats::round_to(diagnosed as f64 / summary.total_students as f64 * 100.0, 1);
        findings.push(format!(
            "{pct}% of respondents have a clinical diagnosis ({diagnosed} students)."
        ));
    }

    let correlation_findings = [
        (CorrelationPair::SymptomsVsPressure, "academic pressure"),
        (CorrelationPair::SymptomsVsGpa, "GPA"),
    ];
    for (pair, subject) in correlation_findings {
        if let Some(c) = correlations.iter().find(|c| c.pair == pair) {
            findings.push(format!(
                "Symptom severity shows a {} correlation with {} (r={}, p={}).",
                c.interpretation, subject, c.coefficient, c.p_value
            ));
        }
    }

    if let Some(avg_symptoms) = summary.avg_symptoms_score {
        if avg_symptoms >= 4.0 {
            findings.push(format!(
                "Population reports high average symptom severity ({avg_symptoms}/5.0)."
            ));
        } else if avg_symptoms >= 3.0 {
            findings.push(format!(
                "Population reports moderate average symptom severity ({avg_symptoms}/5.0)."
            ));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile(
        diagnosis: Option<&str>,
        symptoms: Option<f64>,
        pressure: Option<f64>,
    ) -> StudentProfile {
        StudentProfile {
            id: Uuid::new_v4(),
            full_name: "Sam Reyes".to_string(),
            email: format!("{}@campus.example", Uuid::new_v4()),
            age: Some(21),
            clinical_diagnosis: diagnosis.map(str::to_string),
            awareness_score: Some(3.0),
            pressure_score: pressure,
            symptoms_score: symptoms,
        }
    }

    fn academic(profile_id: Uuid, gpa: Option<f64>) -> AcademicRecord {
        AcademicRecord {
            profile_id,
            term: "2025 - Fall - Midterm".to_string(),
            gpa,
            attendance_percent: Some(90.0),
            study_hours_per_week: Some(12.0),
            created_at: NaiveDate::from_ymd_opt(2025, 10, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    fn survey(profile_id: Uuid, year: i32, month: u32, fatigue: Option<i32>) -> SurveyResponse {
        SurveyResponse {
            profile_id,
            taken_at: NaiveDate::from_ymd_opt(year, month, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            fatigue,
            mood_swings: Some(2),
            sleep_quality: None,
            academic_stress: Some(4),
            headache: false,
            appetite_change: false,
            notes: None,
        }
    }

    #[test]
    fn summary_counts_match_inputs() {
        let profiles = vec![
            profile(Some("Yes"), Some(4.0), Some(3.0)),
            profile(Some("No"), None, Some(2.0)),
            profile(None, Some(2.0), None),
        ];
        let surveys = vec![survey(profiles[0].id, 2026, 1, Some(3))];

        let summary = population_summary(&profiles, &[], &surveys);
        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.total_surveys, 1);
        assert_eq!(summary.total_academic_records, 0);

        let bucket_total: usize = summary.diagnosis_breakdown.values().sum();
        assert_eq!(bucket_total, summary.total_students);
        assert_eq!(summary.diagnosis_breakdown.get(NOT_SPECIFIED), Some(&1));
    }

    #[test]
    fn summary_averages_skip_missing_values() {
        let profiles = vec![
            profile(None, Some(4.0), None),
            profile(None, Some(2.0), None),
            profile(None, None, None),
        ];
        let summary = population_summary(&profiles, &[], &[]);
        assert_eq!(summary.avg_symptoms_score, Some(3.0));
        // No profile has a pressure score, so there is no average at all.
        assert_eq!(summary.avg_pressure_score, None);
    }

    #[test]
    fn summary_on_empty_study_is_all_none() {
        let summary = population_summary(&[], &[], &[]);
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.avg_age, None);
        assert_eq!(summary.avg_symptoms_score, None);
        assert!(summary.diagnosis_breakdown.is_empty());
    }

    #[test]
    fn correlations_omit_pairs_below_three_samples() {
        // Only two profiles carry both symptoms and pressure.
        let profiles = vec![
            profile(None, Some(4.0), Some(4.0)),
            profile(None, Some(2.0), Some(2.0)),
            profile(None, Some(3.0), None),
        ];
        let correlations = correlation_analysis(&profiles, &[], &[]);
        assert!(correlations
            .iter()
            .all(|c| c.pair != CorrelationPair::SymptomsVsPressure));
    }

    #[test]
    fn correlations_report_monotonic_relationship() {
        let profiles: Vec<StudentProfile> = (1..=5)
            .map(|i| profile(None, Some(f64::from(i)), Some(f64::from(i))))
            .collect();
        let academics: Vec<AcademicRecord> = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| academic(p.id, Some(4.0 - i as f64 * 0.5)))
            .collect();

        let correlations = correlation_analysis(&profiles, &academics, &[]);

        let pressure = correlations
            .iter()
            .find(|c| c.pair == CorrelationPair::SymptomsVsPressure)
            .expect("pair should be reported");
        assert_eq!(pressure.coefficient, 1.0);
        assert_eq!(pressure.interpretation, "strong positive");

        let gpa = correlations
            .iter()
            .find(|c| c.pair == CorrelationPair::SymptomsVsGpa)
            .expect("pair should be reported");
        assert_eq!(gpa.coefficient, -1.0);
        assert_eq!(gpa.interpretation, "strong negative");
    }

    #[test]
    fn correlations_pair_survey_fatigue_with_attendance() {
        // Fatigue rises while attendance falls, one survey and one academic
        // record per profile.
        let profiles: Vec<StudentProfile> = (0..4).map(|_| profile(None, None, None)).collect();
        let surveys: Vec<SurveyResponse> = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| survey(p.id, 2026, 2, Some(i as i32 + 1)))
            .collect();
        let academics: Vec<AcademicRecord> = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| AcademicRecord {
                attendance_percent: Some(95.0 - i as f64 * 5.0),
                ..academic(p.id, None)
            })
            .collect();

        let correlations = correlation_analysis(&profiles, &academics, &surveys);

        let fatigue = correlations
            .iter()
            .find(|c| c.pair == CorrelationPair::FatigueVsAttendance)
            .expect("pair should be reported");
        assert_eq!(fatigue.coefficient, -1.0);
        assert_eq!(fatigue.p_value, 0.0);
        assert_eq!(fatigue.interpretation, "strong negative");
    }

    #[test]
    fn diagnosis_groups_average_only_present_scores() {
        let profiles = vec![
            profile(Some("Yes"), Some(5.0), Some(4.0)),
            profile(Some("Yes"), Some(3.0), None),
            profile(Some("No"), None, None),
        ];
        let comparison = diagnosis_comparison(&profiles);

        let yes = comparison.get("Yes").unwrap();
        assert_eq!(yes.count, 2);
        assert_eq!(yes.avg_symptoms, Some(4.0));
        assert_eq!(yes.avg_pressure, Some(4.0));

        let no = comparison.get("No").unwrap();
        assert_eq!(no.count, 1);
        assert_eq!(no.avg_symptoms, None);
    }

    #[test]
    fn time_trends_none_without_surveys() {
        assert!(time_trends(&[]).is_none());
    }

    #[test]
    fn time_trends_bucket_by_month() {
        let owner = Uuid::new_v4();
        let surveys = vec![
            survey(owner, 2026, 1, Some(4)),
            survey(owner, 2026, 1, Some(2)),
            survey(owner, 2026, 2, None),
        ];
        let trends = time_trends(&surveys).unwrap();
        assert_eq!(trends.len(), 2);

        let january = trends.get("2026-01").unwrap();
        assert_eq!(january.avg_fatigue, Some(3.0));

        // February's only response skipped the fatigue item.
        let february = trends.get("2026-02").unwrap();
        assert_eq!(february.avg_fatigue, None);
        assert_eq!(february.avg_stress, Some(4.0));
    }

    #[test]
    fn findings_flag_high_symptom_severity() {
        let profiles: Vec<StudentProfile> = [5.0, 5.0, 4.0, 4.0, 3.0]
            .into_iter()
            .map(|s| profile(None, Some(s), None))
            .collect();
        let summary = population_summary(&profiles, &[], &[]);
        assert_eq!(summary.avg_symptoms_score, Some(4.2));

        let findings = key_findings(&summary, &[]);
        assert!(findings
            .iter()
            .any(|f| f == "Population reports high average symptom severity (4.2/5.0)."));
    }

    #[test]
    fn findings_skip_diagnosis_line_without_yes_bucket() {
        let profiles = vec![profile(Some("No"), Some(2.0), None), profile(None, None, None)];
        let summary = population_summary(&profiles, &[], &[]);
        let findings = key_findings(&summary, &[]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].starts_with("Study includes 2 students"));
    }

    #[test]
    fn full_report_carries_all_sections() {
        let profiles = vec![profile(Some("Yes"), Some(4.0), Some(3.0))];
        let surveys = vec![survey(profiles[0].id, 2026, 3, Some(3))];
        let report = build_report(&profiles, &[], &surveys);

        assert_eq!(report.summary.total_students, 1);
        assert!(report.correlations.is_empty());
        assert_eq!(report.diagnosis_comparison.len(), 1);
        assert!(report.time_trends.is_some());
        assert!(!report.key_findings.is_empty());
    }
}
