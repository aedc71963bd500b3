//! United Kingdom calculators.
//!
//! | Calculator | Levy |
//! |------------|------|
//! | [`UkIncomeTax`] | income tax and employee National Insurance |
//! | [`UkCapitalGains`] | capital gains tax |
//! | [`StampDuty`] | stamp duty land tax on residential purchases |

mod capital_gains;
mod income_tax;
mod stamp_duty;

pub use capital_gains::{CapitalGainsConfig, CapitalGainsInput, UkCapitalGains};
pub use income_tax::{IncomeTaxAssessment, IncomeTaxConfig, IncomeTaxInput, UkIncomeTax};
pub use stamp_duty::{StampDuty, StampDutyAssessment, StampDutyConfig, StampDutyInput};
