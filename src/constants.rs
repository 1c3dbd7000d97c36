/// Weakest-topic rows shown in the school-wide view.
pub const DEFAULT_TOPIC_LIMIT_SCHOOL: usize = 5;

/// Weakest-topic rows shown when scoped to a teacher or class.
pub const DEFAULT_TOPIC_LIMIT_SCOPED: usize = 8;

/// Upper bound for a caller-supplied `topicLimit`.
pub const MAX_TOPIC_LIMIT: usize = 50;

/// In-flight fetches per analytics fan-out batch.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 16;

pub const MAX_ID_LEN: usize = 128;

pub const MAX_TERM_LEN: usize = 64;

pub const MAX_TITLE_LEN: usize = 200;

/// Questions attached to a single test.
pub const MAX_QUESTIONS_PER_TEST: usize = 500;

/// Runs of a score or answer write before a persistent conflict is reported.
pub const MAX_WRITE_ATTEMPTS: usize = 3;
