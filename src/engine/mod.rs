pub mod lifecycle;
pub mod matching;
