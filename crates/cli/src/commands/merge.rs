use std::path::Path;

use tarifa_core::config::LoadOptions;
use tarifa_core::{DistributionResult, RowOverride};

use crate::commands::{load_runtime, read_json, CommandResult};

const COMMAND: &str = "merge";

pub fn run(options: &LoadOptions, distribution: &Path, overrides: &Path) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let documents = read_json::<DistributionResult>(distribution)
        .and_then(|base| Ok((base, read_json::<Vec<RowOverride>>(overrides)?)));
    let (base, overrides) = match documents {
        Ok(documents) => documents,
        Err(error) => return CommandResult::input_failure(COMMAND, &error),
    };

    match runtime.merge_overrides(base, &overrides) {
        Ok(merged) => {
            let message = format!("{} overrides merged", overrides.len());
            CommandResult::with_result(COMMAND, message, Some(merged))
        }
        Err(error) => CommandResult::domain_failure(COMMAND, error),
    }
}
