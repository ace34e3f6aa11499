pub mod extract;
pub use extract::{
    BoxedExtractor, ExtractionError, Extractor, GeminiExtractor, extraction_schema, parse_record,
};

pub mod prompt;
