use rust_decimal::Decimal;

use crate::domain::inputs::Penetration;
use crate::errors::QuotationError;

pub const MIN_DURATION_MINUTES: u32 = 10;

/// Upper bound of each duration band (inclusive) with its (high, low) penetration price in cents.
const BANDS: [(u32, i64, i64); 3] = [(15, 150, 200), (25, 200, 250), (45, 300, 350)];
const OPEN_BAND: (i64, i64) = (400, 450);

/// Unit ticket price paid per completed interview.
pub fn price_for(duration_minutes: u32, penetration: Decimal) -> Result<Decimal, QuotationError> {
    if duration_minutes < MIN_DURATION_MINUTES {
        return Err(QuotationError::invalid(
            "duracionMinutos",
            duration_minutes,
            format!("price table starts at {MIN_DURATION_MINUTES} minutes"),
        ));
    }
    let penetration = Penetration::new(penetration)?;

    let (high, low) = BANDS
        .iter()
        .find(|(upper, _, _)| duration_minutes <= *upper)
        .map(|(_, high, low)| (*high, *low))
        .unwrap_or(OPEN_BAND);

    let cents = if penetration.is_high() { high } else { low };
    Ok(Decimal::new(cents, 2))
}
