pub mod interface;
pub mod google_translator;

pub use interface::*;
pub use google_translator::*;
