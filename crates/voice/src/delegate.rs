//! Rueckmelde-Schnittstellen
//!
//! Engines melden sich beim [`VoiceEngineDelegate`] (dem Manager), der
//! Manager leitet an den [`VoiceManagerDelegate`] der Anwendung weiter.
//! Alle Aufrufe erfolgen synchron aus dem Kontext, der das Ereignis bemerkt.

use std::sync::Arc;

use chorus_audio::{DecodedVoicePacket, VoiceDataSource};
use chorus_protocol::rtp::RtpPacket;

use crate::engine::VoiceEngine;

/// Rueckmeldungen einer Engine an ihren Besitzer
pub trait VoiceEngineDelegate: Send + Sync {
    fn engine_ready(&self, engine: &Arc<dyn VoiceEngine>);

    fn engine_disconnected(&self, engine: &Arc<dyn VoiceEngine>);

    fn opus_data(&self, engine: &Arc<dyn VoiceEngine>, paket: RtpPacket);

    fn raw_data(&self, engine: &Arc<dyn VoiceEngine>, paket: DecodedVoicePacket);

    fn data_source_needed(&self, engine: &Arc<dyn VoiceEngine>) -> Option<Box<dyn VoiceDataSource>>;
}

/// Rueckmeldungen des Managers an die Anwendung
///
/// Der Manager haelt den Delegate nur schwach; die Anwendung besitzt ihn.
pub trait VoiceManagerDelegate: Send + Sync {
    /// Engine ist verbunden und hat eine Datenquelle
    fn on_engine_ready(&self, engine: &Arc<dyn VoiceEngine>);

    /// Engine wurde getrennt oder konnte nicht verbinden
    fn on_engine_disconnected(&self, engine: &Arc<dyn VoiceEngine>);

    /// Opus-Paket empfangen (Dekodierung abgeschaltet)
    fn on_opus_data(&self, engine: &Arc<dyn VoiceEngine>, paket: RtpPacket);

    /// Dekodiertes PCM empfangen
    fn on_raw_data(&self, engine: &Arc<dyn VoiceEngine>, paket: DecodedVoicePacket);

    /// Engine braucht eine neue Datenquelle zum Senden
    fn on_data_source_needed(
        &self,
        engine: &Arc<dyn VoiceEngine>,
    ) -> Option<Box<dyn VoiceDataSource>>;
}
