pub mod api;
pub mod detect;
pub mod flatten;
pub mod handlers;
pub mod reader;
pub mod types;

pub use api::{FetchConfig, HttpApiFetcher, SharedApiFetcher};
pub use detect::SourceFormat;
pub use reader::FormatReader;
pub use types::{SourcePayload, UnsupportedFormat};
