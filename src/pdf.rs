//! PDF rendering for the research report.
//!
//! A pure presentation transform: all numbers arrive already rounded from the
//! report pipeline, and table content is assembled by pure helpers so layout
//! stays testable without parsing PDF output. The document is built fully in
//! memory; nothing touches the destination path until the build succeeded.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::models::ReportData;
use crate::stats;

const PLACEHOLDER_FINDINGS: &str = "Insufficient data for key findings.";
const PLACEHOLDER_CORRELATIONS: &str = "Insufficient data for correlation analysis.";
const PLACEHOLDER_DIAGNOSIS: &str = "Insufficient data for diagnosis group comparison.";

/// Renders the report and writes it to `path`, all-or-nothing. The bytes go
/// to a temporary sibling first and are renamed into place, so a failed build
/// or interrupted write never leaves a partial file at the destination.
pub fn write_pdf(report: &ReportData, path: &Path) -> anyhow::Result<()> {
    let bytes = render_pdf(report)?;
    let tmp = path.with_extension("pdf.tmp");
    fs::write(&tmp, &bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to move report to {}", path.display()));
    }
    Ok(())
}

/// Builds the complete document in memory and returns the PDF bytes.
pub fn render_pdf(report: &ReportData) -> anyhow::Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Campus Wellness Study - Research Report",
        Mm(215.9),
        Mm(279.4),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("failed to load PDF font: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("failed to load PDF font: {e}"))?;
    let italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(|e| anyhow::anyhow!("failed to load PDF font: {e}"))?;

    let mut cursor = Cursor {
        layer: doc.get_page(page1).get_layer(layer1),
        y: 250.0,
    };

    title_page(report, &mut cursor, &font, &bold);
    cursor = new_page(&doc);
    summary_section(report, &doc, &mut cursor, &font, &bold);
    findings_section(report, &doc, &mut cursor, &font, &bold);
    correlation_section(report, &doc, &mut cursor, &font, &bold, &italic);
    diagnosis_section(report, &doc, &mut cursor, &font, &bold);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| anyhow::anyhow!("failed to assemble PDF document: {e}"))?;
    buf.into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush PDF buffer: {e}"))
}

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn down(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn new_page(doc: &PdfDocumentReference) -> Cursor {
    let (page, layer) = doc.add_page(Mm(215.9), Mm(279.4), "Layer 1");
    Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: 260.0,
    }
}

fn ensure_space(doc: &PdfDocumentReference, cursor: &mut Cursor, needed: f32) {
    if cursor.y - needed < 20.0 {
        *cursor = new_page(doc);
    }
}

fn heading(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    text: &str,
    bold: &IndirectFontRef,
) {
    ensure_space(doc, cursor, 30.0);
    cursor.text(text, 14.0, 20.0, bold);
    cursor.down(8.0);
}

fn paragraph(
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    text: &str,
    size: f32,
    font: &IndirectFontRef,
) {
    for line in wrap_text(text, 95) {
        ensure_space(doc, cursor, 5.0);
        cursor.text(&line, size, 20.0, font);
        cursor.down(5.0);
    }
    cursor.down(3.0);
}

fn title_page(
    report: &ReportData,
    cursor: &mut Cursor,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let summary = &report.summary;

    cursor.text("Campus Wellness Study", 22.0, 20.0, bold);
    cursor.down(10.0);
    cursor.text("Research Report", 22.0, 20.0, bold);
    cursor.down(14.0);
    cursor.text(
        "Analysis of Health and Academic Performance Data",
        13.0,
        20.0,
        font,
    );
    cursor.down(16.0);
    cursor.text(&format!("Generated: {}", summary.generated_at), 10.0, 20.0, font);
    cursor.down(16.0);

    cursor.text("Study Overview", 12.0, 20.0, bold);
    cursor.down(7.0);
    let overview = [
        format!("Total Participants: {}", summary.total_students),
        format!("Academic Records: {}", summary.total_academic_records),
        format!("Survey Responses: {}", summary.total_surveys),
        format!("Average Age: {}", fmt_opt(summary.avg_age)),
    ];
    for line in overview {
        cursor.text(&line, 11.0, 25.0, font);
        cursor.down(6.0);
    }
}

fn summary_section(
    report: &ReportData,
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let summary = &report.summary;

    heading(doc, cursor, "Executive Summary", bold);
    paragraph(
        doc,
        cursor,
        &format!(
            "This report presents findings from a study of {} students monitoring the \
             relationship between health symptoms and academic performance. The study \
             collected {} survey responses and {} academic records.",
            summary.total_students, summary.total_surveys, summary.total_academic_records
        ),
        11.0,
        font,
    );

    if !summary.diagnosis_breakdown.is_empty() {
        ensure_space(doc, cursor, 8.0);
        cursor.text("Diagnosis Distribution:", 11.0, 20.0, bold);
        cursor.down(6.0);
        for line in diagnosis_distribution_lines(report) {
            ensure_space(doc, cursor, 5.0);
            cursor.text(&line, 10.0, 25.0, font);
            cursor.down(5.0);
        }
        cursor.down(3.0);
    }

    if summary.avg_awareness_score.is_some() {
        ensure_space(doc, cursor, 26.0);
        cursor.text("Population Baseline Scores:", 11.0, 20.0, bold);
        cursor.down(6.0);
        let scores = [
            format!("Health Awareness: {}/5.0", fmt_opt(summary.avg_awareness_score)),
            format!("Academic Pressure: {}/5.0", fmt_opt(summary.avg_pressure_score)),
            format!("Symptom Severity: {}/5.0", fmt_opt(summary.avg_symptoms_score)),
        ];
        for line in scores {
            cursor.text(&line, 10.0, 25.0, font);
            cursor.down(5.0);
        }
        cursor.down(3.0);
    }
}

fn findings_section(
    report: &ReportData,
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    heading(doc, cursor, "Key Research Findings", bold);

    if report.key_findings.is_empty() {
        paragraph(doc, cursor, PLACEHOLDER_FINDINGS, 11.0, font);
        return;
    }
    for (i, finding) in report.key_findings.iter().enumerate() {
        paragraph(doc, cursor, &format!("{}. {}", i + 1, finding), 11.0, font);
    }
}

fn correlation_section(
    report: &ReportData,
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    italic: &IndirectFontRef,
) {
    heading(doc, cursor, "Correlation Analysis", bold);

    let rows = correlation_rows(report);
    if rows.is_empty() {
        paragraph(doc, cursor, PLACEHOLDER_CORRELATIONS, 11.0, font);
        return;
    }

    const COLS: [f32; 4] = [20.0, 95.0, 125.0, 150.0];
    ensure_space(doc, cursor, 12.0);
    for (x, header) in COLS
        .into_iter()
        .zip(["Variable Pair", "Coefficient (r)", "P-Value", "Interpretation"])
    {
        cursor.text(header, 10.0, x, bold);
    }
    cursor.down(6.0);

    for row in &rows {
        ensure_space(doc, cursor, 6.0);
        for (x, cell) in COLS.into_iter().zip(row) {
            cursor.text(cell, 10.0, x, font);
        }
        cursor.down(5.5);
    }

    cursor.down(3.0);
    paragraph(
        doc,
        cursor,
        "Note: Spearman correlation coefficients range from -1 to +1. \
         P-values < 0.05 indicate statistical significance.",
        9.0,
        italic,
    );
}

fn diagnosis_section(
    report: &ReportData,
    doc: &PdfDocumentReference,
    cursor: &mut Cursor,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    heading(doc, cursor, "Diagnosis Group Comparison", bold);

    let rows = diagnosis_rows(report);
    if rows.is_empty() {
        paragraph(doc, cursor, PLACEHOLDER_DIAGNOSIS, 11.0, font);
        return;
    }

    const COLS: [f32; 5] = [20.0, 65.0, 90.0, 125.0, 160.0];
    ensure_space(doc, cursor, 12.0);
    for (x, header) in COLS
        .into_iter()
        .zip(["Diagnosis", "Count", "Avg Awareness", "Avg Pressure", "Avg Symptoms"])
    {
        cursor.text(header, 10.0, x, bold);
    }
    cursor.down(6.0);

    for row in &rows {
        ensure_space(doc, cursor, 6.0);
        for (x, cell) in COLS.into_iter().zip(row) {
            cursor.text(cell, 10.0, x, font);
        }
        cursor.down(5.5);
    }
}

/// Correlation table body, one row per reported pair.
pub fn correlation_rows(report: &ReportData) -> Vec<[String; 4]> {
    report
        .correlations
        .iter()
        .map(|c| {
            [
                c.pair.label().to_string(),
                c.coefficient.to_string(),
                c.p_value.to_string(),
                c.interpretation.clone(),
            ]
        })
        .collect()
}

/// Diagnosis comparison table body, one row per diagnosis group.
pub fn diagnosis_rows(report: &ReportData) -> Vec<[String; 5]> {
    report
        .diagnosis_comparison
        .iter()
        .map(|(diagnosis, group)| {
            [
                diagnosis.clone(),
                group.count.to_string(),
                fmt_opt(group.avg_awareness),
                fmt_opt(group.avg_pressure),
                fmt_opt(group.avg_symptoms),
            ]
        })
        .collect()
}

/// Executive-summary bullet lines for the diagnosis frequency table.
pub fn diagnosis_distribution_lines(report: &ReportData) -> Vec<String> {
    let total = report.summary.total_students;
    report
        .summary
        .diagnosis_breakdown
        .iter()
        .map(|(diagnosis, &count)| {
            if total == 0 {
                return format!("- {diagnosis}: {count} students");
            }
            let pct = stats::round_to(count as f64 / total as f64 * 100.0, 1);
            format!("- {diagnosis}: {count} students ({pct}%)")
        })
        .collect()
}

/// Shared missing-value rendering for tables and the summary printout.
pub(crate) fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// Greedy word wrap at `width` characters. Words longer than `width` are
/// broken mid-word so no line can overrun the margin.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word = word;
        while let Some((cut, _)) = word.char_indices().nth(width) {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let (head, tail) = word.split_at(cut);
            lines.push(head.to_string());
            word = tail;
        }
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report;

    fn empty_report() -> ReportData {
        report::build_report(&[], &[], &[])
    }

    #[test]
    fn empty_report_renders_without_tables() {
        let data = empty_report();
        assert!(correlation_rows(&data).is_empty());
        assert!(diagnosis_rows(&data).is_empty());

        let bytes = render_pdf(&data).expect("empty report must still render");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn diagnosis_rows_show_na_for_missing_means() {
        use crate::models::{DiagnosisGroupStats, StudentProfile};
        use uuid::Uuid;

        let profiles = vec![StudentProfile {
            id: Uuid::new_v4(),
            full_name: "Robin Okafor".to_string(),
            email: "robin@campus.example".to_string(),
            age: None,
            clinical_diagnosis: Some("Yes".to_string()),
            awareness_score: None,
            pressure_score: None,
            symptoms_score: Some(4.5),
        }];
        let data = report::build_report(&profiles, &[], &[]);

        let rows = diagnosis_rows(&data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Yes");
        assert_eq!(rows[0][1], "1");
        assert_eq!(rows[0][2], "N/A");
        assert_eq!(rows[0][4], "4.5");

        let stats: Vec<&DiagnosisGroupStats> = data.diagnosis_comparison.values().collect();
        assert_eq!(stats[0].avg_awareness, None);
    }

    #[test]
    fn distribution_lines_carry_percentages() {
        use crate::models::StudentProfile;
        use uuid::Uuid;

        let profiles: Vec<StudentProfile> = [Some("Yes"), Some("Yes"), None, Some("No")]
            .into_iter()
            .map(|d| StudentProfile {
                id: Uuid::new_v4(),
                full_name: "Student".to_string(),
                email: format!("{}@campus.example", Uuid::new_v4()),
                age: None,
                clinical_diagnosis: d.map(str::to_string),
                awareness_score: None,
                pressure_score: None,
                symptoms_score: None,
            })
            .collect();
        let data = report::build_report(&profiles, &[], &[]);

        let lines = diagnosis_distribution_lines(&data);
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"- Yes: 2 students (50%)".to_string()));
        assert!(lines.contains(&"- Not Specified: 1 students (25%)".to_string()));
    }

    #[test]
    fn populated_report_renders() {
        use crate::models::{Correlation, CorrelationPair};

        let mut data = empty_report();
        data.correlations.push(Correlation {
            pair: CorrelationPair::SymptomsVsGpa,
            coefficient: -0.45,
            p_value: 0.031,
            interpretation: "moderate negative".to_string(),
        });
        let rows = correlation_rows(&data);
        assert_eq!(rows[0], [
            "Symptoms vs GPA".to_string(),
            "-0.45".to_string(),
            "0.031".to_string(),
            "moderate negative".to_string(),
        ]);

        let bytes = render_pdf(&data).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn write_pdf_leaves_nothing_behind_on_failure() {
        use uuid::Uuid;

        let data = empty_report();
        let dir = std::env::temp_dir().join(format!("wellness-pdf-{}", Uuid::new_v4()));
        let dest = dir.join("report.pdf");

        // The directory does not exist yet, so the temp write fails.
        assert!(write_pdf(&data, &dest).is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("pdf.tmp").exists());

        std::fs::create_dir_all(&dir).unwrap();
        write_pdf(&data, &dest).unwrap();
        assert!(dest.exists());
        assert!(!dest.with_extension("pdf.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn wrap_text_respects_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn wrap_text_breaks_over_long_words() {
        let lines = wrap_text("supercalifragilistic", 8);
        assert_eq!(lines, vec!["supercal", "ifragili", "stic"]);

        let lines = wrap_text("a bcdefghijk c", 5);
        assert_eq!(lines, vec!["a", "bcdef", "ghijk", "c"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 5));
    }

    #[test]
    fn fmt_opt_renders_missing_as_na() {
        assert_eq!(fmt_opt(None), "N/A");
        assert_eq!(fmt_opt(Some(3.25)), "3.25");
    }
}
