//! Room engine configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tunables for the room engine
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Chat messages included in a snapshot
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum characters in one chat message
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Queued outbound messages per connection before pushes are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Buffered room list changes per subscriber
    #[serde(default = "default_room_list_buffer")]
    pub room_list_buffer: usize,
}

impl RoomsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check("history_limit", self.history_limit, 1, 500)?;
        check("max_message_length", self.max_message_length, 1, 5000)?;
        check("outbound_buffer", self.outbound_buffer, 8, 65_536)?;
        check("room_list_buffer", self.room_list_buffer, 1, 65_536)?;
        Ok(())
    }
}

fn check(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_message_length: default_max_message_length(),
            outbound_buffer: default_outbound_buffer(),
            room_list_buffer: default_room_list_buffer(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

fn default_max_message_length() -> usize {
    500
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_room_list_buffer() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RoomsConfig::default();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.max_message_length, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = RoomsConfig {
            history_limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::OutOfRange { field: "history_limit", .. })
        ));
    }
}
