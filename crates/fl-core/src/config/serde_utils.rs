//! Shared serialization/deserialization utilities for configuration

/// Helper module for `Option<Duration>` serialization as seconds
///
/// A missing field or `0` means "no limit".
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Config {
///     #[serde(default, with = "fl_core::config::serde_utils::optional_duration_secs")]
///     timeout: Option<Duration>,
/// }
/// ```
pub mod optional_duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as seconds, `0` when unset
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.map(|d| d.as_secs()).unwrap_or(0))
    }

    /// Deserialize from seconds, treating `0` as unset
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }
}
