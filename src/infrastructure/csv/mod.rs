// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, upload decoding, and export

mod csv_parser;
mod csv_writer;
mod upload;

pub use csv_parser::parse_csv;
pub use csv_writer::export_csv;
pub use upload::{decode_csv_bytes, read_csv_file, validate_upload, CSV_MIME_TYPE};
