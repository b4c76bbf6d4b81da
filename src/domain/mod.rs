pub mod credential;
pub mod types;
