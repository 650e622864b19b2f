pub mod error;
pub mod http;

pub use error::FetchError;
pub use http::{StatusSource, TranslationClient};
