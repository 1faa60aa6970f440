pub mod file;
pub mod history;
pub mod stdin;
