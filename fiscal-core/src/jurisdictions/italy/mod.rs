//! Italian calculators: IRPEF with its local surcharges, and IMU.

mod imu;
mod irpef;

pub use imu::{Imu, ImuAssessment, ImuConfig, ImuInput};
pub use irpef::{Irpef, IrpefConfig, IrpefInput};
