// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types and value objects for parsed tabular data
// No I/O, no async

mod cell_value;
mod table;

pub use cell_value::{coerce_number, format_number, CellValue};
pub use table::{Row, Table};
