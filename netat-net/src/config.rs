//! Dialer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for [`dial_in_with`](crate::dial_in_with)
///
/// Addresses are always tried one at a time and names are resolved on the
/// confined thread; racing families or a resolver task would run work
/// outside the target namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialConfig {
    /// Connect timeout, applied to each address attempt; zero means none
    #[serde(with = "opt_duration_ms")]
    pub timeout: Option<Duration>,

    /// Set `TCP_NODELAY` on TCP connections
    pub nodelay: bool,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            nodelay: true,
        }
    }
}

impl DialConfig {
    /// Create a new dialer configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt connect timeout; `Duration::ZERO` clears it
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    /// Effective connect timeout, with zero treated as none
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    /// Enable or disable `TCP_NODELAY`
    #[must_use]
    pub const fn with_nodelay(mut self, enable: bool) -> Self {
        self.nodelay = enable;
        self
    }
}

// Optional Duration as milliseconds
mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation, clippy::ref_option)]
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.filter(|&ms| ms != 0).map(Duration::from_millis))
    }
}
