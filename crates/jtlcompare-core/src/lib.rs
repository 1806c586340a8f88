pub mod analysis;
pub mod compare;
pub mod error;
pub mod export;
pub mod history;
pub mod jtl;
pub mod processor;
pub mod settings;
pub mod upload;

pub use error::JtlError;
pub use processor::{process_jtl, process_jtl_with_progress, ProcessedResult};
