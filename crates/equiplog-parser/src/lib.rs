pub mod classifier;
pub mod columns;
pub mod errors;
pub mod model;
mod records;

pub use classifier::{classify_readings, classify_row, leading_number, Thresholds};
pub use columns::{ColumnMapping, SemanticField};
pub use errors::ParserError;
pub use model::{EquipmentRecord, Status, StatusKind};
pub use records::{parse_equipment_csv, ParsedDataset};

#[cfg(test)]
mod tests;
