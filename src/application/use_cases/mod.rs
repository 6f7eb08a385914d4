pub mod csv_extractor;
pub mod normalizer;
pub mod sanitizer;
pub mod upload;
pub mod worksheet_extractor;
