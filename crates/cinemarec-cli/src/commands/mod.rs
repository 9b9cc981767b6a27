pub mod auth;
pub mod clear;
pub mod config;
pub mod context;
pub mod preferences;
pub mod prompts;
pub mod quizzes;
pub mod recommendations;
pub mod reviews;
pub mod stats;
pub mod ui;
pub mod watch;
