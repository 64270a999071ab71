use std::path::Path;

use tarifa_core::config::LoadOptions;
use tarifa_core::QuotationInputs;

use crate::commands::{load_runtime, read_json, CommandResult};

const COMMAND: &str = "distribute";

/// Base distribution for the inputs' coverage mode, or `coverage` when given.
pub fn run(options: &LoadOptions, input: &Path, coverage: Option<&str>) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };
    let inputs = match read_json::<QuotationInputs>(input) {
        Ok(inputs) => inputs,
        Err(error) => return CommandResult::input_failure(COMMAND, &error),
    };

    let coverage = coverage.unwrap_or(&inputs.coverage);
    match runtime.compute_distribution(coverage, &inputs) {
        Ok(distribution) => {
            let message = format!(
                "{} rows, {} interviews over {} project days",
                distribution.rows.len(),
                distribution.totals.interviews,
                distribution.totals.project_days
            );
            CommandResult::with_result(COMMAND, message, Some(distribution))
        }
        Err(error) => CommandResult::domain_failure(COMMAND, error),
    }
}
