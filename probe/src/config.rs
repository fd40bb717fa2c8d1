//! Probe-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Fehlt die Datei, laeuft die Probe mit
//! Standardwerten.

use chorus_protocol::codec::CodecConfig;
use serde::{Deserialize, Serialize};

/// Umgebungsvariable mit dem Pfad der Konfigurationsdatei
pub const CONFIG_VARIABLE: &str = "CHORUS_CONFIG";
pub const STANDARD_PFAD: &str = "chorus.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub logging: LoggingEinstellungen,
    /// Gain und Verschleierungs-Frame-Groesse des Decoders
    pub codec: CodecConfig,
    pub eingabe: EingabeEinstellungen,
    pub ausgabe: AusgabeEinstellungen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter-Direktive: "trace", "debug", "info", "warn", "error" ...
    pub level: String,
    /// "text" oder "json"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EingabeEinstellungen {
    /// Mitschnitt-Datei; kann per Kommandozeile ueberschrieben werden
    pub datei: Option<String>,
    /// Nur Pakete dieser Quelle dekodieren
    pub ssrc: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AusgabeEinstellungen {
    /// Ziel fuer rohes PCM (i16 LE, 48 kHz Stereo)
    pub datei: Option<String>,
}

impl ProbeConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config: Self = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config
            .codec
            .validieren()
            .map_err(|e| anyhow::anyhow!("Ungueltige Codec-Konfiguration in '{pfad}': {e}"))?;
        Ok(config)
    }

    /// Pfad aus `CHORUS_CONFIG`, sonst `chorus.toml`
    pub fn pfad_aus_env() -> String {
        std::env::var(CONFIG_VARIABLE).unwrap_or_else(|_| STANDARD_PFAD.into())
    }
}
