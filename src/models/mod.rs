pub mod event;
pub mod farmer;
pub mod matching;
pub mod operator;
pub mod request;
