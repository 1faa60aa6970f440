pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use clap::ValueEnum;
use serde_json::Value;

/// How `gsv` renders a command's `{result, methodology, warnings}` envelope.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full envelope, pretty-printed
    Json,
    /// Scalars as a field/value table, then the ledger or sensitivity grid
    Table,
    /// The ledger, estimates, or one row per sensitivity grid point
    Csv,
    /// Only the headline number (net value, estimates, rmse)
    Minimal,
}

impl OutputFormat {
    pub fn render(self, value: &Value) {
        match self {
            OutputFormat::Json => json::print_json(value),
            OutputFormat::Table => table::print_table(value),
            OutputFormat::Csv => csv_out::print_csv(value),
            OutputFormat::Minimal => minimal::print_minimal(value),
        }
    }
}
