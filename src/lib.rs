pub mod ai;
pub mod appointment;
pub mod calendar;
pub mod cli;
pub mod core;
pub mod form;
pub mod gemini;
pub mod images;
