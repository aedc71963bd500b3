//! Allowance and exemption resolution.
//!
//! Allowance tables map a category (relationship to a deceased, legal form
//! of a business, asset class…) to the reduction it earns. Holding-period
//! rules additionally depend on how many full years the asset was held.

use tracing::debug;

use super::CalculationError;
use crate::models::{Allowance, AllowanceRule, AllowanceTable};

/// Looks up `category` in `table` and resolves it to a concrete allowance.
///
/// # Arguments
///
/// * `table` - The allowance table to search
/// * `category` - The key to look up, e.g. `child` or `sole_proprietor`
/// * `held_years` - Completed years of ownership; only consulted by
///   holding-period rules, pass `0` for tables keyed on anything else
///
/// # Returns
///
/// The [`Allowance`] for the category. Holding-period rules resolve to the
/// percentage reduction reached after `held_years`.
///
/// # Errors
///
/// Returns [`CalculationError::OutOfDomain`] when the category is not in the
/// table. Unknown categories are never treated as a zero allowance.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use rust_decimal_macros::dec;
/// use fiscal_core::calculations::resolve_allowance;
/// use fiscal_core::{Allowance, AllowanceRule, AllowanceTable};
///
/// let table = AllowanceTable::new(
///     "inheritance_allowances",
///     BTreeMap::from([(
///         "child".to_string(),
///         AllowanceRule::ExemptAmount { amount: dec!(400000) },
///     )]),
/// );
///
/// let allowance = resolve_allowance(&table, "child", 0).unwrap();
/// assert_eq!(allowance, Allowance::ExemptAmount { amount: dec!(400000) });
/// assert!(resolve_allowance(&table, "neighbour", 0).is_err());
/// ```
pub fn resolve_allowance(
    table: &AllowanceTable,
    category: &str,
    held_years: u32,
) -> Result<Allowance, CalculationError> {
    let rule = table
        .rule(category)
        .ok_or_else(|| CalculationError::out_of_domain(&table.name, category))?;

    let allowance = match rule {
        AllowanceRule::ExemptAmount { amount } => Allowance::ExemptAmount { amount: *amount },
        AllowanceRule::HoldingPeriod(schedule) => Allowance::PercentReduction {
            percent: schedule.percent_for(held_years),
        },
        AllowanceRule::FullExemption => Allowance::FullExemption,
    };

    debug!(table = %table.name, category, held_years, ?allowance, "resolved allowance");
    Ok(allowance)
}
