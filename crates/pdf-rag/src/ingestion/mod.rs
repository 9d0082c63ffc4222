//! PDF ingestion pipeline

mod chunker;
mod ingestor;
mod parser;
pub mod sample;

pub use chunker::TextChunker;
pub use ingestor::{IngestReport, PdfIngestor};
pub use parser::{PageText, PdfParser};
