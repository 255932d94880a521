mod image;
mod schema;

pub use image::{mime_for_path, InlineImage, DEFAULT_IMAGE_MIME};
pub use schema::{
    decode_analysis, response_schema, AnalysisResult, Metric, RawAnalysisResponse,
    REQUIRED_FIELDS,
};
