use html_escape::encode_text;

use crate::analytics::aggregate::AggregateRow;
use crate::analytics::{AnalyticsReport, ScopeFilter};
use crate::reports::format_pct;

pub const NO_ANSWER_DATA: &str = "No answer-level data recorded";
pub const UNAVAILABLE: &str = "Unavailable";

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;color:#222}\
table{border-collapse:collapse;margin-bottom:1.5rem;width:100%}\
th,td{border:1px solid #999;padding:4px 8px;text-align:left}\
th{background:#eee}.empty{color:#666;font-style:italic}\
@media print{body{margin:0}}";

fn cell(value: &str) -> String {
    format!("<td>{}</td>", encode_text(value))
}

fn table(out: &mut String, heading: &str, headers: &[&str], rows: Vec<Vec<String>>, empty: &str) {
    out.push_str(&format!("<h2>{}</h2>\n", encode_text(heading)));
    if rows.is_empty() {
        out.push_str(&format!("<p class=\"empty\">{}</p>\n", encode_text(empty)));
        return;
    }
    out.push_str("<table>\n<thead><tr>");
    for header in headers {
        out.push_str(&format!("<th>{}</th>", encode_text(header)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for value in row {
            out.push_str(&cell(&value));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn aggregate_table(out: &mut String, heading: &str, rows: &[AggregateRow]) {
    let body = rows
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.attempts.to_string(),
                r.tests_count.to_string(),
                format_pct(Some(r.avg_pct)),
            ]
        })
        .collect();
    table(
        out,
        heading,
        &["Name", "Attempts", "Tests", "Average %"],
        body,
        "No scored attempts",
    );
}

fn scope_summary(filter: &ScopeFilter) -> String {
    let parts: Vec<String> = [
        ("Teacher", &filter.teacher_id),
        ("Class", &filter.class_id),
        ("Subject", &filter.subject_id),
        ("Term", &filter.term),
    ]
    .iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("{label}: {v}"))
    })
    .collect();
    if parts.is_empty() {
        "Whole school".to_string()
    } else {
        parts.join(" / ")
    }
}

/// Standalone printable page for one report. All report text is escaped.
pub fn render_print(report: &AnalyticsReport, school_id: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Assessment analytics</title>\n");
    out.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n"));
    out.push_str(&format!(
        "<h1>Assessment analytics: {}</h1>\n<p>{}</p>\n",
        encode_text(school_id),
        encode_text(&scope_summary(&report.scope))
    ));

    let overall = match report.overall_avg_pct {
        Some(pct) => format!("{}%", format_pct(Some(pct))),
        None => UNAVAILABLE.to_string(),
    };
    out.push_str(&format!(
        "<p>Overall average: <strong>{}</strong> across {} attempts on {} tests</p>\n",
        encode_text(&overall),
        report.attempt_count,
        report.test_count
    ));

    let trend = report
        .trend
        .iter()
        .map(|p| {
            vec![
                p.date.clone().unwrap_or_default(),
                p.title.clone(),
                p.attempts.to_string(),
                format_pct(Some(p.avg_pct)),
            ]
        })
        .collect();
    table(
        &mut out,
        "Trend",
        &["Date", "Test", "Attempts", "Average %"],
        trend,
        "No scored tests",
    );

    let distribution = report
        .distribution
        .iter()
        .map(|b| vec![b.bucket.clone(), b.count.to_string()])
        .collect();
    table(&mut out, "Distribution", &["Band", "Attempts"], distribution, "");

    aggregate_table(&mut out, "By class", &report.by_class);
    aggregate_table(&mut out, "By subject", &report.by_subject);
    aggregate_table(&mut out, "By teacher", &report.by_teacher);

    let students = report
        .by_student
        .iter()
        .map(|s| {
            vec![
                s.row.name.clone(),
                s.row.attempts.to_string(),
                format_pct(Some(s.row.avg_pct)),
                s.latest_date.clone().unwrap_or_default(),
            ]
        })
        .collect();
    table(
        &mut out,
        "Students needing attention",
        &["Student", "Attempts", "Average %", "Latest"],
        students,
        "No scored attempts",
    );

    let topics = report
        .weakest_topics
        .iter()
        .map(|t| {
            vec![
                t.title.clone(),
                format!("{}/{}", t.correct, t.total),
                format_pct(Some(t.pct_correct)),
            ]
        })
        .collect();
    let topics_empty = if report.has_answer_data {
        "No topic results"
    } else {
        NO_ANSWER_DATA
    };
    table(
        &mut out,
        "Weakest topics",
        &["Topic", "Correct", "% correct"],
        topics,
        topics_empty,
    );

    let coverage = report
        .coverage
        .iter()
        .map(|c| {
            vec![
                c.date.clone().unwrap_or_default(),
                c.title.clone(),
                c.total_marks.to_string(),
                c.attempts.to_string(),
                c.status.as_str().replace('_', " "),
                c.avg_pct
                    .map(|v| format_pct(Some(v)))
                    .unwrap_or_else(|| UNAVAILABLE.to_string()),
            ]
        })
        .collect();
    table(
        &mut out,
        "Marking coverage",
        &["Date", "Test", "Total marks", "Attempts", "Status", "Average %"],
        coverage,
        "No tests in scope",
    );

    out.push_str("</body>\n</html>\n");
    out
}
