//! Data Sweeper - CSV & Excel cleaning and conversion
//!
//! Loads CSV / XLSX uploads into typed tables, cleans them, narrows them to a
//! column selection, charts them and exports them back to CSV or XLSX.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod job;
pub mod session;
pub mod xlsx;

pub use config::Settings;
pub use data::{load, Table};
pub use export::{DataExporter, Download, ExportError, TargetFormat};
pub use job::FileJob;
pub use session::{run_batch, BatchReport, CleanOp, FileReport, Level, Notice, Plan, Upload};
