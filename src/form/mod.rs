pub mod controller;
pub use controller::FormController;

pub mod models;
pub use models::*;
