use serde::{Deserialize, Serialize};

use crate::analytics::types::TestRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Admin,
    #[default]
    Teacher,
}

impl ActorRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(ActorRole::Admin),
            "teacher" => Some(ActorRole::Teacher),
            _ => None,
        }
    }
}

/// Who is asking and for which school. Passed explicitly into every collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeContext {
    pub school_id: String,
    pub actor_id: Option<String>,
    pub actor_role: ActorRole,
}

impl ScopeContext {
    pub fn new(school_id: impl Into<String>) -> Self {
        Self {
            school_id: school_id.into(),
            actor_id: None,
            actor_role: ActorRole::default(),
        }
    }
}

/// AND-combined restriction on the test collection. Absent or blank fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeFilter {
    pub teacher_id: Option<String>,
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub term: Option<String>,
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ScopeFilter {
    pub fn matches(&self, test: &TestRecord) -> bool {
        active(&self.teacher_id).map_or(true, |id| test.teacher.id == id)
            && active(&self.class_id).map_or(true, |id| test.class.id == id)
            && active(&self.subject_id).map_or(true, |id| test.subject.id == id)
            && active(&self.term).map_or(true, |term| test.term.as_deref() == Some(term))
    }

    /// True when the view spans the whole school rather than one teacher or class.
    pub fn is_school_wide(&self) -> bool {
        active(&self.teacher_id).is_none() && active(&self.class_id).is_none()
    }
}
