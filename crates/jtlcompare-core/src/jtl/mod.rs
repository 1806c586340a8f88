//! Reading JMeter CSV result files.

pub mod column;
pub mod parser;
pub mod record;
pub mod version;

pub use column::{ColumnLayout, JtlColumn};
pub use parser::{parse_jtl, split_fields, FieldWarning, ParsedJtl};
pub use record::JtlRecord;
pub use version::extract_jmeter_version;
