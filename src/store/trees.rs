pub const TESTS: &str = "tests";
pub const QUESTIONS: &str = "questions";
pub const ATTEMPTS: &str = "attempts";
pub const ATTEMPT_INDEX: &str = "attempt_index";
pub const ATTEMPT_ANSWERS: &str = "attempt_answers";

// Reference dimensions
pub const CLASSES: &str = "classes";
pub const SUBJECTS: &str = "subjects";
pub const TEACHERS: &str = "teachers";
pub const STUDENTS: &str = "students";
pub const TOPICS: &str = "topics";

pub const META: &str = "meta";
