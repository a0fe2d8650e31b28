use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Timestamp(SystemTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn into_inner(self) -> SystemTime {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        self.0.duration_since(earlier.0).unwrap_or_default()
    }

    pub fn as_millis(&self) -> u128 {
        self.0
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

impl From<Timestamp> for SystemTime {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

// milliseconds since the unix epoch
impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_since_is_saturating() {
        let earlier = Timestamp::from(UNIX_EPOCH + Duration::from_millis(1_000));
        let later = Timestamp::from(UNIX_EPOCH + Duration::from_millis(1_250));
        assert_eq!(later.duration_since(&earlier), Duration::from_millis(250));
        assert_eq!(earlier.duration_since(&later), Duration::ZERO);
    }

    #[test]
    fn test_display_is_epoch_millis() {
        let timestamp = Timestamp::from(UNIX_EPOCH + Duration::from_millis(1_700));
        assert_eq!(timestamp.to_string(), "1700");
    }

    #[test]
    fn test_serde_round_trip_keeps_instant() {
        let timestamp = Timestamp::now();
        let serialized = serde_json::to_string(&timestamp).unwrap();
        assert!(serialized.contains("secs_since_epoch"));
        let deserialized: Timestamp = serde_json::from_str(&serialized).unwrap();
        assert_eq!(timestamp, deserialized);
    }
}
