pub mod types;

pub use types::{EntityType, Hit, OutputFormat, ResultPage, SearchOutcome};
