mod allowance;
mod calculation_result;
mod holding_period;
mod jurisdiction;
mod percent;
mod tax_bracket;
mod year_tables;

pub use allowance::{Allowance, AllowanceRule, AllowanceStep, AllowanceTable, HoldingPeriodSchedule};
pub use calculation_result::{CalculationResult, TaxComponent, TaxComponentKind};
pub use holding_period::{Holding, HoldingPeriod};
pub use jurisdiction::{Country, JurisdictionKey};
pub use percent::Percent;
pub use tax_bracket::{BracketTable, BracketTableError, TaxBracket};
pub use year_tables::YearTables;
