//! Engine configuration.
//!
//! Every rate the calculation passes apply that is not supplied by the form
//! or the entry lives here. All fields default, so a partial TOML file (or
//! none at all) is valid.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dentbooks_forms::MAX_PERCENT;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// GST percentage charged on the service-facility fee.
    pub service_fee_gst_rate: Decimal,
    /// Superannuation percentage used when neither the entry nor the form
    /// sets one.
    pub default_super_percent: Decimal,
    /// GST percentage charged on the outwork charge.
    pub outwork_gst_rate: Decimal,
    /// Outwork charge percentage used when the entry omits one.
    pub default_outwork_rate_percent: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            service_fee_gst_rate: Decimal::TEN,
            default_super_percent: Decimal::from(12),
            outwork_gst_rate: Decimal::TEN,
            default_outwork_rate_percent: Decimal::TEN,
        }
    }
}

impl EngineConfig {
    /// Reject negative or out-of-range percentages.
    pub fn validate(&self) -> Result<(), EngineError> {
        let rates = [
            ("service_fee_gst_rate", self.service_fee_gst_rate),
            ("default_super_percent", self.default_super_percent),
            ("outwork_gst_rate", self.outwork_gst_rate),
            ("default_outwork_rate_percent", self.default_outwork_rate_percent),
        ];
        for (name, rate) in rates {
            if rate.is_sign_negative() || rate > MAX_PERCENT {
                return Err(EngineError::InvalidConfig {
                    field: name.to_string(),
                    message: format!("{} is not a usable percentage", rate),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.service_fee_gst_rate, Decimal::TEN);
        assert_eq!(config.default_super_percent, Decimal::from(12));
        assert_eq!(config.outwork_gst_rate, Decimal::TEN);
        assert_eq!(config.default_outwork_rate_percent, Decimal::TEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_value(serde_json::json!({"default_super_percent": 11.5})).unwrap();
        assert_eq!(config.default_super_percent, Decimal::new(115, 1));
        assert_eq!(config.service_fee_gst_rate, Decimal::TEN);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let config = EngineConfig {
            outwork_gst_rate: Decimal::NEGATIVE_ONE,
            ..EngineConfig::default()
        };
        match config.validate().unwrap_err() {
            EngineError::InvalidConfig { field, .. } => assert_eq!(field, "outwork_gst_rate"),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }
}
