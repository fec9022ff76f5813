pub mod app;
pub mod cli;
pub mod forms;
pub mod render;
