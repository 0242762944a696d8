//! Plan loading: CSV scanning, header-aware row mapping, file loading.

pub mod csv;
pub mod parser;
pub mod types;

pub use csv::parse_csv_line;
pub use parser::{
    ColumnSpec, PlanColumns, PlanLoadError, PlanParser, load_plan, normalize_header, parse_plan,
    read_plan,
};
pub use types::PlanDay;
