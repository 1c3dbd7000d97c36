//! Presentation of an `AnalyticsReport`: per-section CSV exports and a printable HTML page.

pub mod csv;
pub mod html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportSection {
    Classes,
    Subjects,
    Teachers,
    Students,
    Topics,
    Coverage,
    Trend,
    Distribution,
}

impl ExportSection {
    pub const ALL: [ExportSection; 8] = [
        ExportSection::Classes,
        ExportSection::Subjects,
        ExportSection::Teachers,
        ExportSection::Students,
        ExportSection::Topics,
        ExportSection::Coverage,
        ExportSection::Trend,
        ExportSection::Distribution,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExportSection::Classes => "classes",
            ExportSection::Subjects => "subjects",
            ExportSection::Teachers => "teachers",
            ExportSection::Students => "students",
            ExportSection::Topics => "topics",
            ExportSection::Coverage => "coverage",
            ExportSection::Trend => "trend",
            ExportSection::Distribution => "distribution",
        }
    }

    pub fn file_name(self) -> String {
        format!("analytics-{}.csv", self.as_str())
    }
}

/// Two-decimal percentage, or empty when there is nothing to show.
pub fn format_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}
