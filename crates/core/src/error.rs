//! Fehlertypen fuer chorus-core

use thiserror::Error;

/// Result-Alias fuer chorus-core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Fehler beim Umgang mit den gemeinsamen Typen
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Ungueltige Snowflake-ID: '{0}'")]
    UngueltigeSnowflake(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = CoreError::UngueltigeSnowflake("abc".into());
        assert_eq!(e.to_string(), "Ungueltige Snowflake-ID: 'abc'");
    }
}
