pub mod answers;
pub mod attempts;
pub mod questions;
pub mod reference;
pub mod test_papers;
