//! Voice-Verbindungsverwaltung pro Guild
//!
//! Der Manager sammelt pro Guild zwei unabhaengig eintreffende Gateway-Daten
//! (Voice-State und Voice-Server-Info) und startet erst eine Engine, wenn
//! beide vorliegen.
//!
//! Alle drei Guild-Tabellen liegen hinter einer einzigen, nicht reentranten
//! Sperre. Verbindungsauf- und -abbau laufen ausserhalb der Sperre auf der
//! tokio-Runtime; der Resync-Lauf nach einem Verlassen ebenfalls erst nach
//! Freigabe der Sperre.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use chorus_audio::{DecodedVoicePacket, VoiceDataSource};
use chorus_core::GuildId;
use chorus_protocol::gateway::{VoiceServerInfo, VoiceState};
use chorus_protocol::rtp::RtpPacket;
use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::delegate::{VoiceEngineDelegate, VoiceManagerDelegate};
use crate::engine::{EngineConfig, EngineFactory, EngineParameter, VoiceEngine};

/// Guild-Tabellen des Managers
#[derive(Default)]
struct ManagerState {
    voice_states: HashMap<GuildId, VoiceState>,
    voice_server_infos: HashMap<GuildId, VoiceServerInfo>,
    engines: HashMap<GuildId, Arc<dyn VoiceEngine>>,
}

/// Verwaltet die Voice-Engines aller Guilds
pub struct VoiceManager {
    delegate: Weak<dyn VoiceManagerDelegate>,
    factory: Box<dyn EngineFactory>,
    config: EngineConfig,
    runtime: Handle,
    state: Mutex<ManagerState>,
    selbst: Weak<VoiceManager>,
}

impl VoiceManager {
    /// Erstellt einen Manager
    ///
    /// `runtime` fuehrt die Verbindungsauf- und -abbauten aus.
    pub fn neu(
        delegate: Weak<dyn VoiceManagerDelegate>,
        factory: Box<dyn EngineFactory>,
        config: EngineConfig,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new_cyclic(|selbst| Self {
            delegate,
            factory,
            config,
            runtime,
            state: Mutex::new(ManagerState::default()),
            selbst: selbst.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Gateway-Eingaenge
    // -----------------------------------------------------------------------

    /// Uebernimmt den eigenen Voice-State einer Guild
    ///
    /// Ohne Kanal wird der gespeicherte State entfernt; sonst wird ein
    /// Verbindungsversuch gestartet.
    pub fn set_voice_state(&self, voice_state: VoiceState) {
        let guild_id = voice_state.guild_id;
        if !voice_state.ist_verbunden() {
            tracing::debug!(guild_id = %guild_id, "Voice-State ohne Kanal, entferne Eintrag");
            self.state.lock().voice_states.remove(&guild_id);
            return;
        }

        self.state.lock().voice_states.insert(guild_id, voice_state);
        self.start_voice_connection(guild_id);
    }

    /// Uebernimmt die Voice-Server-Daten einer Guild und startet einen Verbindungsversuch
    pub fn set_voice_server_info(&self, info: VoiceServerInfo) {
        let guild_id = info.guild_id;
        self.state.lock().voice_server_infos.insert(guild_id, info);
        self.start_voice_connection(guild_id);
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Startet eine Engine fuer die Guild, sofern State und Server-Info vorliegen
    ///
    /// Eine bestehende Engine wird ersetzt; ihre Datenquelle und ihr Schluessel
    /// gehen an die neue Engine.
    /// Ein bereits verworfener Anwendungs-Delegate verhindert den Aufbau nicht.
    pub fn start_voice_connection(&self, guild_id: GuildId) {
        let (neu, alt) = {
            let mut state = self.state.lock();
            let (Some(voice_state), Some(server_info)) = (
                state.voice_states.get(&guild_id).cloned(),
                state.voice_server_infos.get(&guild_id).cloned(),
            ) else {
                tracing::trace!(guild_id = %guild_id, "Voice-Daten unvollstaendig, warte");
                return;
            };

            let vorherige = state.engines.get(&guild_id).cloned();
            let (quelle, secret) = match &vorherige {
                Some(engine) => (engine.take_source(), engine.secret()),
                None => (None, None),
            };

            let delegate: Weak<dyn VoiceEngineDelegate> = self.selbst.clone();
            let engine = self.factory.erstellen(
                EngineParameter {
                    guild_id,
                    voice_state,
                    server_info,
                    config: self.config.clone(),
                    quelle,
                    secret,
                },
                delegate,
            );

            let alt = state.engines.insert(guild_id, Arc::clone(&engine));
            (engine, alt)
        };

        if let Some(alt) = alt {
            tracing::debug!(guild_id = %guild_id, "Ersetzte Voice-Engine wird geschlossen");
            alt.close();
        }

        tracing::info!(guild_id = %guild_id, "Verbinde Voice-Engine");
        let manager = self.selbst.clone();
        self.runtime.spawn(async move {
            if let Err(e) = neu.connect().await {
                tracing::warn!(guild_id = %guild_id, fehler = %e, "Verbindungsaufbau fehlgeschlagen");
                if let Some(manager) = manager.upgrade() {
                    manager.engine_did_disconnect(&neu);
                }
            }
        });
    }

    /// Verlaesst den Voice-Kanal einer Guild
    ///
    /// Ohne Engine passiert nichts. Sonst werden State und Server-Info
    /// entfernt, die Engine getrennt und alle uebrigen Engines neu aufgebaut.
    pub fn leave_voice_channel(&self, guild_id: GuildId) {
        let engine = {
            let mut state = self.state.lock();
            let Some(engine) = state.engines.get(&guild_id).cloned() else {
                tracing::warn!(guild_id = %guild_id, "Keine Voice-Engine zum Verlassen");
                return;
            };
            state.voice_states.remove(&guild_id);
            state.voice_server_infos.remove(&guild_id);
            engine
        };

        tracing::info!(guild_id = %guild_id, "Verlasse Voice-Kanal");
        self.runtime.spawn(async move {
            engine.disconnect().await;
        });

        self.resync_engines(guild_id);
    }

    /// Baut alle Engines ausser `ausser` neu auf
    ///
    /// Das Trennen einer Engine kann die gemeinsam genutzte Verbindung der
    /// anderen stoeren.
    pub fn resync_engines(&self, ausser: GuildId) {
        let guilds: Vec<GuildId> = self
            .state
            .lock()
            .engines
            .keys()
            .copied()
            .filter(|g| *g != ausser)
            .collect();

        if !guilds.is_empty() {
            tracing::debug!(anzahl = guilds.len(), "Resync der Voice-Engines");
        }
        for guild_id in guilds {
            self.start_voice_connection(guild_id);
        }
    }

    /// Entfernt eine getrennte Engine und meldet das an den Delegate
    ///
    /// Ist bereits eine andere Engine fuer die Guild eingetragen, bleibt diese
    /// bestehen. Es erfolgt kein automatischer Neuaufbau.
    pub fn engine_did_disconnect(&self, engine: &Arc<dyn VoiceEngine>) {
        let guild_id = engine.guild_id();
        {
            let mut state = self.state.lock();
            let ist_aktuell = state
                .engines
                .get(&guild_id)
                .is_some_and(|e| Arc::ptr_eq(e, engine));
            if ist_aktuell {
                state.engines.remove(&guild_id);
            }
        }

        tracing::info!(guild_id = %guild_id, "Voice-Engine getrennt");
        if let Some(delegate) = self.delegate.upgrade() {
            delegate.on_engine_disconnected(engine);
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn engine(&self, guild_id: GuildId) -> Option<Arc<dyn VoiceEngine>> {
        self.state.lock().engines.get(&guild_id).cloned()
    }

    pub fn engine_count(&self) -> usize {
        self.state.lock().engines.len()
    }

    pub fn voice_state(&self, guild_id: GuildId) -> Option<VoiceState> {
        self.state.lock().voice_states.get(&guild_id).cloned()
    }

    pub fn voice_server_info(&self, guild_id: GuildId) -> Option<VoiceServerInfo> {
        self.state.lock().voice_server_infos.get(&guild_id).cloned()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl VoiceEngineDelegate for VoiceManager {
    fn engine_ready(&self, engine: &Arc<dyn VoiceEngine>) {
        tracing::info!(guild_id = %engine.guild_id(), "Voice-Engine bereit");
        if let Some(delegate) = self.delegate.upgrade() {
            delegate.on_engine_ready(engine);
        }
    }

    fn engine_disconnected(&self, engine: &Arc<dyn VoiceEngine>) {
        self.engine_did_disconnect(engine);
    }

    fn opus_data(&self, engine: &Arc<dyn VoiceEngine>, paket: RtpPacket) {
        if let Some(delegate) = self.delegate.upgrade() {
            delegate.on_opus_data(engine, paket);
        }
    }

    fn raw_data(&self, engine: &Arc<dyn VoiceEngine>, paket: DecodedVoicePacket) {
        if let Some(delegate) = self.delegate.upgrade() {
            delegate.on_raw_data(engine, paket);
        }
    }

    fn data_source_needed(&self, engine: &Arc<dyn VoiceEngine>) -> Option<Box<dyn VoiceDataSource>> {
        self.delegate
            .upgrade()
            .and_then(|delegate| delegate.on_data_source_needed(engine))
    }
}
