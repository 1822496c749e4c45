#![forbid(unsafe_code)]

pub mod model;
pub mod selection;

pub use selection::{QuestionBank, pick_random};
