use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Static-ish dimensions used as grouping keys and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Class,
    Subject,
    Teacher,
    Student,
    Topic,
}

impl ReferenceKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "class" | "classes" => Some(ReferenceKind::Class),
            "subject" | "subjects" => Some(ReferenceKind::Subject),
            "teacher" | "teachers" => Some(ReferenceKind::Teacher),
            "student" | "students" => Some(ReferenceKind::Student),
            "topic" | "topics" => Some(ReferenceKind::Topic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Class => "class",
            ReferenceKind::Subject => "subject",
            ReferenceKind::Teacher => "teacher",
            ReferenceKind::Student => "student",
            ReferenceKind::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntity {
    pub id: String,
    pub school_id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    fn reference_tree(&self, kind: ReferenceKind) -> &sled::Tree {
        match kind {
            ReferenceKind::Class => &self.classes,
            ReferenceKind::Subject => &self.subjects,
            ReferenceKind::Teacher => &self.teachers,
            ReferenceKind::Student => &self.students,
            ReferenceKind::Topic => &self.topics,
        }
    }

    pub fn upsert_reference(
        &self,
        kind: ReferenceKind,
        entity: &ReferenceEntity,
    ) -> Result<(), StoreError> {
        let key = keys::reference_key(&entity.school_id, &entity.id)?;
        self.reference_tree(kind)
            .insert(key.as_bytes(), Self::serialize(entity)?)?;
        Ok(())
    }

    pub fn get_reference(
        &self,
        kind: ReferenceKind,
        school_id: &str,
        id: &str,
    ) -> Result<Option<ReferenceEntity>, StoreError> {
        let key = keys::reference_key(school_id, id)?;
        match self.reference_tree(kind).get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_references(
        &self,
        kind: ReferenceKind,
        school_id: &str,
    ) -> Result<Vec<ReferenceEntity>, StoreError> {
        let prefix = keys::school_prefix(school_id)?;
        let mut rows: Vec<ReferenceEntity> = Self::scan_values(self.reference_tree(kind), &prefix)?;
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    /// Display label for `id`, falling back to the id itself when the row is missing.
    pub fn reference_label(
        &self,
        kind: ReferenceKind,
        school_id: &str,
        id: &str,
    ) -> Result<String, StoreError> {
        Ok(self
            .get_reference(kind, school_id, id)?
            .map(|entity| entity.name)
            .unwrap_or_else(|| id.to_string()))
    }
}
