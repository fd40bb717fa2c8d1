//! Voice-Daten aus dem Gateway
//!
//! Die Gateway-Session liefert pro Guild zwei voneinander unabhaengige
//! Ereignisse: den eigenen Voice-State und die Voice-Server-Daten. Erst wenn
//! beide vorliegen, kann eine Voice-Verbindung aufgebaut werden.

use std::collections::HashMap;

use chorus_core::{ChannelId, GuildId, UserId};
use serde::{Deserialize, Serialize};

/// Voice-State eines Benutzers in einer Guild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceState {
    pub guild_id: GuildId,
    /// `None` wenn der Benutzer keinen Voice-Kanal belegt
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    pub session_id: String,
    pub deaf: bool,
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub suppress: bool,
}

impl VoiceState {
    /// Prueft ob der Benutzer einem Voice-Kanal zugeordnet ist
    pub fn ist_verbunden(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Baut die Benutzer-Zuordnung aus der Voice-State-Liste einer Guild
    ///
    /// Die Guild-ID der Liste ueberschreibt die der einzelnen Eintraege,
    /// da das Gateway sie dort weglaesst.
    pub fn nach_benutzer(guild_id: GuildId, states: Vec<VoiceState>) -> HashMap<UserId, VoiceState> {
        states
            .into_iter()
            .map(|mut state| {
                state.guild_id = guild_id;
                (state.user_id, state)
            })
            .collect()
    }
}

/// Verbindungsdaten des Voice-Servers einer Guild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceServerInfo {
    pub guild_id: GuildId,
    pub endpoint: String,
    pub token: String,
}
