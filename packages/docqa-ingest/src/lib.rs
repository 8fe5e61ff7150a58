//! Turns uploaded archives and PDFs into plain-text documents ready for chunking.

pub mod archive;
pub mod pdf;
pub mod upload;

mod error;

pub use archive::unzip;
pub use error::{Error, Result};
pub use pdf::{Document, LoadReport, SkippedFile, extract_pdf, find_pdfs, load_pdfs};
pub use upload::{UploadKind, sanitize_file_name, save_upload};
