//! Gemeinsame Identifikationstypen fuer chorus
//!
//! Alle Plattform-IDs sind Snowflakes aus einem gemeinsamen ID-Raum.
//! Eine Rolle kann deshalb dieselbe ID wie ihre Guild tragen (die implizite
//! "everyone"-Rolle), und ein Overwrite-Ziel ist entweder eine Rollen- oder
//! eine Benutzer-ID. Die Aliase dienen nur der Lesbarkeit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Beginn der Plattform-Epoche in Millisekunden seit 1970 (2015-01-01T00:00:00Z)
pub const PLATTFORM_EPOCHE_MS: u64 = 1_420_070_400_000;

/// 64-Bit Snowflake-ID
///
/// Wird im JSON als Dezimal-String uebertragen, akzeptiert beim Lesen aber
/// auch Zahlen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

/// ID einer Guild
pub type GuildId = Snowflake;
/// ID eines Kanals
pub type ChannelId = Snowflake;
/// ID eines Benutzers
pub type UserId = Snowflake;
/// ID einer Rolle
pub type RoleId = Snowflake;
/// Ziel-ID eines Permission-Overwrites (Rolle oder Benutzer)
pub type OverwriteId = Snowflake;

impl Snowflake {
    /// Erstellt eine Snowflake aus dem Rohwert
    pub const fn neu(wert: u64) -> Self {
        Self(wert)
    }

    /// Gibt den Rohwert zurueck
    pub const fn wert(&self) -> u64 {
        self.0
    }

    /// Erstellungszeitpunkt, kodiert in den oberen 42 Bit
    pub fn zeitstempel(&self) -> Option<DateTime<Utc>> {
        let ms = (self.0 >> 22).checked_add(PLATTFORM_EPOCHE_MS)?;
        DateTime::from_timestamp_millis(i64::try_from(ms).ok()?)
    }
}

impl From<u64> for Snowflake {
    fn from(wert: u64) -> Self {
        Self(wert)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::UngueltigeSnowflake(s.to_string()))
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("eine Snowflake als String oder Zahl")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(format!("negative Snowflake: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_als_string_serialisiert() {
        let id = Snowflake(175928847299117063);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"175928847299117063\"");
    }

    #[test]
    fn snowflake_aus_string_und_zahl() {
        let a: Snowflake = serde_json::from_str("\"42\"").unwrap();
        let b: Snowflake = serde_json::from_str("42").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<Snowflake>("\"kein-id\"").is_err());
    }

    #[test]
    fn snowflake_zeitstempel() {
        // Beispiel-ID aus der Plattform-Dokumentation: 2016-04-30T11:18:25.796Z
        let id = Snowflake(175928847299117063);
        let zeit = id.zeitstempel().unwrap();
        assert_eq!(zeit.timestamp_millis(), 1462015105796);
    }

    #[test]
    fn snowflake_parse_fehler() {
        let fehler = "-1".parse::<Snowflake>().unwrap_err();
        assert_eq!(fehler, CoreError::UngueltigeSnowflake("-1".into()));
    }
}
