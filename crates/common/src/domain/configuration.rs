use crate::domain::{DomainError, DomainResult};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Operating configuration of a device.
///
/// The serialized form is the payload pushed to the device and the body
/// accepted by the operator API, so the wire names are kept short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Configuration {
    #[serde(rename = "min_temp")]
    #[garde(skip)]
    pub min_temperature: i32,

    #[serde(rename = "max_temp")]
    #[garde(skip)]
    pub max_temperature: i32,

    #[serde(rename = "ping_period")]
    #[garde(range(min = 1))]
    pub ping_period_seconds: i32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            min_temperature: 20,
            max_temperature: 30,
            ping_period_seconds: 10,
        }
    }
}

impl Configuration {
    /// Field-level rules plus the `min <= max` relation between bounds.
    pub fn validate_bounds(&self) -> DomainResult<()> {
        crate::garde::validate_struct(self)?;
        if self.min_temperature > self.max_temperature {
            return Err(DomainError::InvalidConfiguration(format!(
                "min_temp ({}) must not exceed max_temp ({})",
                self.min_temperature, self.max_temperature
            )));
        }
        Ok(())
    }
}
