//! Schnittstelle zur Voice-Engine einer Guild
//!
//! Eine Engine ist eine aktive (oder im Aufbau befindliche) Transport- und
//! Codec-Session fuer genau eine Guild. Die eigentliche Netzwerk-Anbindung
//! (Voice-Gateway, UDP, Verschluesselung) liefert eine externe
//! [`EngineFactory`]-Implementierung.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chorus_audio::VoiceDataSource;
use chorus_core::GuildId;
use chorus_protocol::codec::CodecConfig;
use chorus_protocol::gateway::{VoiceServerInfo, VoiceState};
use serde::{Deserialize, Serialize};

use crate::delegate::VoiceEngineDelegate;
use crate::error::VoiceResult;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Verhalten einer Engine beim Empfang
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Eingehende Voice-Pakete lesen
    pub stimme_empfangen: bool,
    /// Eingehende Pakete zu PCM dekodieren statt Opus weiterzureichen
    pub stimme_dekodieren: bool,
    /// Codec-Parameter fuer Encoder und Decoder
    pub codec: CodecConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stimme_empfangen: true,
            stimme_dekodieren: false,
            codec: CodecConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceEngine
// ---------------------------------------------------------------------------

/// Eine Voice-Verbindung fuer eine Guild
#[async_trait]
pub trait VoiceEngine: Send + Sync {
    fn guild_id(&self) -> GuildId;

    /// Baut die Verbindung auf
    ///
    /// Ein Fehler wird vom Manager als Verbindungsabbruch behandelt.
    async fn connect(&self) -> VoiceResult<()>;

    /// Trennt die Verbindung und meldet das ueber den Engine-Delegate
    async fn disconnect(&self);

    /// Beendet eine ersetzte Engine ohne Rueckmeldung an den Delegate
    fn close(&self);

    /// Entnimmt die Datenquelle zur Uebergabe an eine Nachfolge-Engine
    fn take_source(&self) -> Option<Box<dyn VoiceDataSource>>;

    /// Schluessel der aktuellen Sitzung, falls bereits ausgehandelt
    fn secret(&self) -> Option<Vec<u8>>;
}

/// Alles, was eine neue Engine zum Start braucht
pub struct EngineParameter {
    pub guild_id: GuildId,
    pub voice_state: VoiceState,
    pub server_info: VoiceServerInfo,
    pub config: EngineConfig,
    /// Quelle der ersetzten Engine
    pub quelle: Option<Box<dyn VoiceDataSource>>,
    /// Schluessel der ersetzten Engine
    pub secret: Option<Vec<u8>>,
}

/// Erzeugt Engines fuer den Manager
///
/// Wird unter der Manager-Sperre aufgerufen und darf den Manager daher
/// nicht zurueckrufen.
pub trait EngineFactory: Send + Sync {
    fn erstellen(
        &self,
        parameter: EngineParameter,
        delegate: Weak<dyn VoiceEngineDelegate>,
    ) -> Arc<dyn VoiceEngine>;
}
