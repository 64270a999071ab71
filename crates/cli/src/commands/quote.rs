use std::path::Path;

use tarifa_core::config::LoadOptions;
use tarifa_core::{InputChanges, QuotationInputs, RowOverride};

use crate::commands::{load_runtime, read_json, read_optional_json, CommandResult};

const COMMAND: &str = "quote";

pub struct QuoteArgs<'a> {
    pub input: &'a Path,
    pub changes: Option<&'a Path>,
    pub overrides: Option<&'a Path>,
    pub keep_overrides: bool,
}

/// Full rebuild from stored inputs, optional changes and optional prior overrides.
pub fn run(options: &LoadOptions, args: QuoteArgs<'_>) -> CommandResult {
    let runtime = match load_runtime(COMMAND, options) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let documents = read_json::<QuotationInputs>(args.input).and_then(|stored| {
        let changes = read_optional_json::<InputChanges>(args.changes)?;
        let overrides = read_optional_json::<Vec<RowOverride>>(args.overrides)?;
        Ok((stored, changes, overrides))
    });
    let (stored, changes, overrides) = match documents {
        Ok(documents) => documents,
        Err(error) => return CommandResult::input_failure(COMMAND, &error),
    };

    match runtime.rebuild(&stored, &changes, &overrides, args.keep_overrides) {
        Ok(quotation) => {
            let message = format!(
                "{} line items, total {} ({} per interview)",
                quotation.build.line_items.len(),
                quotation.build.total_payable,
                quotation.build.cost_per_interview
            );
            CommandResult::with_result(COMMAND, message, Some(quotation))
        }
        Err(error) => CommandResult::domain_failure(COMMAND, error),
    }
}
