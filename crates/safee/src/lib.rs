pub mod agent;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod scoring;
pub mod speech;
pub mod tools;
pub mod transcript;
