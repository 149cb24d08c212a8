pub mod generation_interface;
pub mod cohere_generator;
pub mod openai_generator;
pub mod generation_factory;

pub use generation_interface::*;
pub use cohere_generator::*;
pub use openai_generator::*;
pub use generation_factory::*;

use crate::error::AppError;

pub(crate) const FETCH_FAILED: &str = "Failed to fetch generation response";
pub(crate) const INVALID_RESPONSE: &str = "Invalid response from generation provider";

pub(crate) fn generation_failed(message: &str) -> AppError {
    AppError::Generation(message.to_string())
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
