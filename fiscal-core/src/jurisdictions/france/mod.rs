//! French calculators.
//!
//! | Calculator | Levy |
//! |------------|------|
//! | [`FrenchIncomeTax`] | impôt sur le revenu with the quotient familial |
//! | [`PropertyGains`] | plus-value immobilière: income tax and social contributions |
//! | [`SecuritiesGains`] | flat tax (PFU) or the progressive option |

mod income_tax;
mod property_gains;
mod securities;

pub use income_tax::{
    FrenchIncomeTax, Household, IncomeTaxAssessment, IncomeTaxConfig, IncomeTaxInput,
};
pub use property_gains::{
    PropertyGains, PropertyGainsAssessment, PropertyGainsConfig, PropertyGainsInput,
};
pub use securities::{SecuritiesConfig, SecuritiesGains, SecuritiesInput, SecuritiesRegime};
