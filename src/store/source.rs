//! Serves the analytics facade straight from the sled trees.

use std::collections::HashMap;

use crate::analytics::scope::ScopeContext;
use crate::analytics::source::{AnalyticsSource, SourceError};
use crate::analytics::types::{AnswerRecord, AttemptRecord, NamedRef, TestRecord, TopicRef};
use crate::store::operations::reference::ReferenceKind;
use crate::store::{Store, StoreError};

impl From<StoreError> for SourceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, key } => SourceError::NotFound { entity, key },
            other => SourceError::fetch("store", other.to_string()),
        }
    }
}

/// Memoizes label lookups for the lifetime of one fetch.
struct Labels<'a> {
    store: &'a Store,
    school_id: &'a str,
    cache: HashMap<(ReferenceKind, String), String>,
}

impl<'a> Labels<'a> {
    fn new(store: &'a Store, school_id: &'a str) -> Self {
        Self {
            store,
            school_id,
            cache: HashMap::new(),
        }
    }

    fn named(&mut self, kind: ReferenceKind, id: &str) -> Result<NamedRef, StoreError> {
        let cache_key = (kind, id.to_string());
        if let Some(name) = self.cache.get(&cache_key) {
            return Ok(NamedRef::new(id, name.clone()));
        }
        let name = self.store.reference_label(kind, self.school_id, id)?;
        self.cache.insert(cache_key, name.clone());
        Ok(NamedRef::new(id, name))
    }
}

impl Store {
    fn resolve_tests(&self, school_id: &str) -> Result<Vec<TestRecord>, StoreError> {
        let mut labels = Labels::new(self, school_id);
        self.list_tests(school_id)?
            .into_iter()
            .map(|paper| {
                Ok(TestRecord {
                    class: labels.named(ReferenceKind::Class, &paper.class_id)?,
                    subject: labels.named(ReferenceKind::Subject, &paper.subject_id)?,
                    teacher: labels.named(ReferenceKind::Teacher, &paper.teacher_id)?,
                    id: paper.id,
                    title: paper.title,
                    term: paper.term,
                    date: paper.date,
                    total_marks: paper.total_marks,
                })
            })
            .collect()
    }

    fn resolve_attempts(&self, school_id: &str, test_id: &str) -> Result<Vec<AttemptRecord>, StoreError> {
        let mut labels = Labels::new(self, school_id);
        self.list_attempts(school_id, test_id)?
            .into_iter()
            .map(|attempt| {
                Ok(AttemptRecord {
                    student: labels.named(ReferenceKind::Student, &attempt.student_id)?,
                    id: attempt.id,
                    test_id: attempt.test_id,
                    total_score: attempt.total_score,
                    submitted_at: attempt.submitted_at,
                    answer_count: attempt.answer_count,
                })
            })
            .collect()
    }

    /// Answers with their topic resolved through the question. A deleted question or topic
    /// leaves `topic` empty rather than failing the fetch.
    fn resolve_answers(&self, school_id: &str, attempt_id: &str) -> Result<Vec<AnswerRecord>, StoreError> {
        let attempt = self.require_attempt(school_id, attempt_id)?;
        let topic_by_question: HashMap<String, Option<String>> = self
            .list_questions(school_id, &attempt.test_id)?
            .into_iter()
            .map(|q| (q.id, q.topic_id))
            .collect();

        let mut topics: HashMap<String, Option<TopicRef>> = HashMap::new();
        let mut out = Vec::new();
        for answer in self.list_answers(school_id, attempt_id)? {
            let topic = match topic_by_question.get(&answer.question_id).cloned().flatten() {
                Some(topic_id) => match topics.get(&topic_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let resolved = self
                            .get_reference(ReferenceKind::Topic, school_id, &topic_id)?
                            .map(|entity| TopicRef {
                                id: entity.id,
                                title: entity.name,
                            });
                        topics.insert(topic_id, resolved.clone());
                        resolved
                    }
                },
                None => None,
            };
            out.push(AnswerRecord {
                id: answer.id,
                attempt_id: answer.attempt_id,
                question_id: answer.question_id,
                topic,
                is_correct: answer.is_correct,
                score: answer.score,
            });
        }
        Ok(out)
    }
}

impl AnalyticsSource for Store {
    async fn list_tests(&self, scope: &ScopeContext) -> Result<Vec<TestRecord>, SourceError> {
        Ok(self.resolve_tests(&scope.school_id)?)
    }

    async fn list_attempts(
        &self,
        scope: &ScopeContext,
        test_id: &str,
    ) -> Result<Vec<AttemptRecord>, SourceError> {
        Ok(self.resolve_attempts(&scope.school_id, test_id)?)
    }

    async fn list_answers(
        &self,
        scope: &ScopeContext,
        attempt_id: &str,
    ) -> Result<Vec<AnswerRecord>, SourceError> {
        Ok(self.resolve_answers(&scope.school_id, attempt_id)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::analytics::scope::ActorRole;
    use crate::store::operations::answers::AnswerInput;
    use crate::store::operations::questions::Question;
    use crate::store::operations::reference::ReferenceEntity;
    use crate::store::operations::test_papers::TestPaper;

    fn reference(store: &Store, kind: ReferenceKind, id: &str, name: &str) {
        store
            .upsert_reference(
                kind,
                &ReferenceEntity {
                    id: id.to_string(),
                    school_id: "s1".to_string(),
                    name: name.to_string(),
                    updated_at: Utc::now(),
                },
            )
            .unwrap();
    }

    fn question(id: &str, topic_id: Option<&str>) -> Question {
        Question {
            id: id.to_string(),
            school_id: "s1".to_string(),
            test_id: "t1".to_string(),
            topic_id: topic_id.map(str::to_string),
            prompt: String::new(),
            marks: 1,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn joins_labels_and_topics() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("src").to_str().unwrap()).unwrap();
        reference(&store, ReferenceKind::Class, "c1", "7A");
        reference(&store, ReferenceKind::Student, "stu1", "Ada");
        reference(&store, ReferenceKind::Topic, "tp1", "Fractions");
        store
            .upsert_test(&TestPaper {
                id: "t1".to_string(),
                school_id: "s1".to_string(),
                title: "Quiz".to_string(),
                class_id: "c1".to_string(),
                subject_id: "sub1".to_string(),
                teacher_id: "tch1".to_string(),
                term: Some("Autumn".to_string()),
                date: Some("2024-09-10".to_string()),
                total_marks: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
        store.add_question(&question("q1", Some("tp1"))).unwrap();
        store.add_question(&question("q2", Some("tp-gone"))).unwrap();
        store.add_question(&question("q3", None)).unwrap();
        let attempt = store.record_score("s1", "t1", "stu1", 0.0).unwrap();
        let answers: Vec<AnswerInput> = ["q1", "q2", "q3"]
            .iter()
            .map(|q| AnswerInput {
                question_id: q.to_string(),
                is_correct: true,
                score: 1.0,
            })
            .collect();
        store.replace_answers("s1", &attempt.id, &answers).unwrap();

        let scope = ScopeContext {
            actor_role: ActorRole::Admin,
            ..ScopeContext::new("s1")
        };
        let tests = AnalyticsSource::list_tests(&store, &scope).await.unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].class, NamedRef::new("c1", "7A"));
        // No subject row: the id doubles as the label.
        assert_eq!(tests[0].subject, NamedRef::new("sub1", "sub1"));
        assert_eq!(tests[0].total_marks, 3);

        let attempts = AnalyticsSource::list_attempts(&store, &scope, "t1").await.unwrap();
        assert_eq!(attempts[0].student.name, "Ada");
        assert!(attempts[0].has_answers());

        let mut records = AnalyticsSource::list_answers(&store, &scope, &attempt.id).await.unwrap();
        records.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        assert_eq!(
            records[0].topic,
            Some(TopicRef {
                id: "tp1".to_string(),
                title: "Fractions".to_string()
            })
        );
        assert_eq!(records[1].topic, None);
        assert_eq!(records[2].topic, None);
    }

    #[tokio::test]
    async fn unknown_attempt_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("src2").to_str().unwrap()).unwrap();
        let scope = ScopeContext::new("s1");
        let err = AnalyticsSource::list_answers(&store, &scope, "nope").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }
}
