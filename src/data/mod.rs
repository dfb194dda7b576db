//! Data module - loading, typing, cleaning and projecting tables

mod cleaner;
mod loader;
mod projector;
mod table;

pub use cleaner::{DataCleaner, DedupOutcome, FillOutcome, FilledColumn};
pub use loader::{extension_of, load, DataLoader, LoaderError, SourceFormat};
pub use projector::Projector;
pub use table::{
    format_number, infer_kind, normalize_headers, parse_number, CellValue, ColumnKind, Table,
    TableError,
};
