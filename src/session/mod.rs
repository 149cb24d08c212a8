pub mod state;
pub mod controller;

pub use state::*;
pub use controller::*;
