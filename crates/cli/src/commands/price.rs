use rust_decimal::Decimal;
use serde::Serialize;
use tarifa_core::{price_for, Penetration};

use crate::commands::CommandResult;

const COMMAND: &str = "price";

#[derive(Debug, Serialize)]
struct PriceQuote {
    duration_minutes: u32,
    penetration: Decimal,
    ticket_price: Decimal,
}

/// Unit ticket price; penetration accepts fractions, percentages and alta/media/baja.
pub fn run(duration_minutes: u32, penetration: &str) -> CommandResult {
    let priced = penetration.parse::<Penetration>().and_then(|penetration| {
        let ticket_price = price_for(duration_minutes, penetration.fraction())?;
        Ok(PriceQuote { duration_minutes, penetration: penetration.fraction(), ticket_price })
    });

    match priced {
        Ok(quote) => {
            let message = format!("{} per completed interview", quote.ticket_price);
            CommandResult::with_result(COMMAND, message, Some(quote))
        }
        Err(error) => CommandResult::domain_failure(COMMAND, error),
    }
}
