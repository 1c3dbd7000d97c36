use crate::analytics::aggregate::AggregateRow;
use crate::analytics::AnalyticsReport;
use crate::reports::{format_pct, ExportSection};

/// Quote a field only when it would otherwise break the row.
pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| csv_quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

fn aggregate_rows(out: &mut String, rows: &[AggregateRow]) {
    push_row(out, &["id", "name", "attempts", "testsCount", "avgPct"]);
    for row in rows {
        push_row(
            out,
            &[
                row.id.clone(),
                row.name.clone(),
                row.attempts.to_string(),
                row.tests_count.to_string(),
                format_pct(Some(row.avg_pct)),
            ],
        );
    }
}

pub fn section_csv(report: &AnalyticsReport, section: ExportSection) -> String {
    let mut out = String::new();
    match section {
        ExportSection::Classes => aggregate_rows(&mut out, &report.by_class),
        ExportSection::Subjects => aggregate_rows(&mut out, &report.by_subject),
        ExportSection::Teachers => aggregate_rows(&mut out, &report.by_teacher),
        ExportSection::Students => {
            push_row(
                &mut out,
                &["id", "name", "attempts", "testsCount", "avgPct", "latestDate"],
            );
            for student in &report.by_student {
                push_row(
                    &mut out,
                    &[
                        student.row.id.clone(),
                        student.row.name.clone(),
                        student.row.attempts.to_string(),
                        student.row.tests_count.to_string(),
                        format_pct(Some(student.row.avg_pct)),
                        student.latest_date.clone().unwrap_or_default(),
                    ],
                );
            }
        }
        ExportSection::Topics => {
            push_row(&mut out, &["topicId", "title", "correct", "total", "pctCorrect"]);
            for topic in &report.weakest_topics {
                push_row(
                    &mut out,
                    &[
                        topic.topic_id.clone(),
                        topic.title.clone(),
                        topic.correct.to_string(),
                        topic.total.to_string(),
                        format_pct(Some(topic.pct_correct)),
                    ],
                );
            }
        }
        ExportSection::Coverage => {
            push_row(
                &mut out,
                &["testId", "title", "date", "totalMarks", "attempts", "status", "avgPct"],
            );
            for row in &report.coverage {
                push_row(
                    &mut out,
                    &[
                        row.test_id.clone(),
                        row.title.clone(),
                        row.date.clone().unwrap_or_default(),
                        row.total_marks.to_string(),
                        row.attempts.to_string(),
                        row.status.as_str().to_string(),
                        format_pct(row.avg_pct),
                    ],
                );
            }
        }
        ExportSection::Trend => {
            push_row(&mut out, &["testId", "title", "date", "avgPct", "attempts"]);
            for point in &report.trend {
                push_row(
                    &mut out,
                    &[
                        point.test_id.clone(),
                        point.title.clone(),
                        point.date.clone().unwrap_or_default(),
                        format_pct(Some(point.avg_pct)),
                        point.attempts.to_string(),
                    ],
                );
            }
        }
        ExportSection::Distribution => {
            push_row(&mut out, &["bucket", "count"]);
            for bucket in &report.distribution {
                push_row(&mut out, &[bucket.bucket.clone(), bucket.count.to_string()]);
            }
        }
    }
    out
}
