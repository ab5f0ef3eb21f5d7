pub mod scanner;

pub use scanner::{ScanError, ScanMetrics, TemplateScanner};
