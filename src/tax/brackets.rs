use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::reports::percent_of;

/// Income range taxed at a marginal rate
///
/// `upper: None` means the bracket is unbounded. `rate` is a fraction
/// (0.10 = 10%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(lower: Decimal, upper: Option<Decimal>, rate: Decimal) -> Self {
        Self { lower, upper, rate }
    }
}

/// Tax owed on the slice of income inside one bracket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketTax {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxLiability {
    pub taxable_income: Decimal,
    pub total_tax: Decimal,
    /// total_tax / taxable_income, in percent
    pub effective_rate: Decimal,
    /// Rate of the highest bracket the income reaches, in percent
    pub marginal_rate: Decimal,
    pub brackets: Vec<BracketTax>,
}

/// Brackets must be ascending and non-overlapping with rates within [0, 1].
/// Only the last bracket may be unbounded.
pub fn validate_brackets(brackets: &[TaxBracket]) -> ReportResult<()> {
    let mut previous_upper: Option<Decimal> = None;

    for (idx, bracket) in brackets.iter().enumerate() {
        let position = idx + 1;

        if bracket.lower < Decimal::ZERO {
            return Err(ReportError::ValidationError(format!(
                "bracket {}: lower bound {} is negative",
                position, bracket.lower
            )));
        }
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return Err(ReportError::ValidationError(format!(
                "bracket {}: rate {} must be between 0 and 1",
                position, bracket.rate
            )));
        }
        if let Some(upper) = bracket.upper {
            if upper <= bracket.lower {
                return Err(ReportError::ValidationError(format!(
                    "bracket {}: upper bound {} must exceed lower bound {}",
                    position, upper, bracket.lower
                )));
            }
        }
        if idx > 0 {
            match previous_upper {
                None => {
                    return Err(ReportError::ValidationError(format!(
                        "bracket {} follows an unbounded bracket",
                        position
                    )))
                }
                Some(prev) if bracket.lower < prev => {
                    return Err(ReportError::ValidationError(format!(
                        "bracket {} overlaps the previous bracket (starts at {}, previous ends at {})",
                        position, bracket.lower, prev
                    )))
                }
                Some(_) => {}
            }
        }
        previous_upper = bracket.upper;
    }

    Ok(())
}

/// Progressive tax on `taxable_income`.
///
/// Each bracket's rate applies to the income above the previous bracket's
/// upper bound (the first bracket's lower bound for the first one) and at or
/// below its own upper bound, so a gap between brackets is taxed at the rate
/// of the bracket that follows it. Non-positive income and an empty bracket
/// list both produce zero liability.
pub fn calculate_liability(
    taxable_income: Decimal,
    brackets: &[TaxBracket],
) -> ReportResult<TaxLiability> {
    validate_brackets(brackets)?;

    let mut liability = TaxLiability {
        taxable_income,
        ..Default::default()
    };
    if taxable_income <= Decimal::ZERO {
        return Ok(liability);
    }

    let mut floor = brackets.first().map_or(Decimal::ZERO, |b| b.lower);
    for bracket in brackets {
        if taxable_income <= floor {
            break;
        }
        let ceiling = match bracket.upper {
            Some(upper) => upper.min(taxable_income),
            None => taxable_income,
        };
        let taxed_amount = ceiling - floor;
        let tax = taxed_amount * bracket.rate;
        if let Some(upper) = bracket.upper {
            floor = upper;
        }

        liability.total_tax += tax;
        liability.marginal_rate = bracket.rate * Decimal::ONE_HUNDRED;
        liability.brackets.push(BracketTax {
            lower: bracket.lower,
            upper: bracket.upper,
            rate: bracket.rate,
            taxed_amount,
            tax,
        });
    }

    liability.effective_rate = percent_of(liability.total_tax, taxable_income);
    Ok(liability)
}
