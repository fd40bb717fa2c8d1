//! Guild-Modelle fuer die Berechtigungsaufloesung
//!
//! Reine Schnappschuesse ohne I/O. Listen aus dem JSON der Plattform werden
//! beim Einlesen in Maps nach ID umgewandelt.

use std::collections::{HashMap, HashSet};

use chorus_core::{ChannelId, GuildId, OverwriteId, RoleId, Snowflake, UserId};
use serde::{Deserialize, Serialize};

use crate::permissions::Permissions;
use crate::resolver;

/// Objekte mit eigener Snowflake-ID (Schluessel in den Maps)
pub trait HatId {
    fn id(&self) -> Snowflake;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub user: User,
    pub roles: HashSet<RoleId>,
    pub nick: Option<String>,
}

impl Member {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

impl HatId for Member {
    fn id(&self) -> Snowflake {
        self.user.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Permissions,
    pub position: i32,
}

impl HatId for Role {
    fn id(&self) -> Snowflake {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Overwrites
// ---------------------------------------------------------------------------

/// Ziel eines Overwrites
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteType {
    #[default]
    Role,
    Member,
}

/// Kanal-spezifische Ausnahme fuer eine Rolle oder ein Mitglied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionOverwrite {
    /// Rollen- oder Benutzer-ID; die Guild-ID steht fuer "everyone"
    pub id: OverwriteId,
    #[serde(rename = "type")]
    pub kind: OverwriteType,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl PermissionOverwrite {
    /// Wendet das Overwrite an: erst `deny` entfernen, dann `allow` setzen
    pub fn anwenden(&self, basis: Permissions) -> Permissions {
        (basis - self.deny) | self.allow
    }
}

impl HatId for PermissionOverwrite {
    fn id(&self) -> Snowflake {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Kanaele
// ---------------------------------------------------------------------------

/// Kanaltyp (numerisch im JSON)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    #[default]
    Text,
    Direkt,
    Voice,
    Gruppe,
    Kategorie,
    News,
    Stage,
    Unbekannt(u8),
}

impl ChannelKind {
    /// Kanaele, in denen Sprach-Berechtigungen gelten
    pub fn ist_sprachfaehig(&self) -> bool {
        matches!(self, ChannelKind::Voice | ChannelKind::Stage)
    }
}

impl From<u8> for ChannelKind {
    fn from(wert: u8) -> Self {
        match wert {
            0 => ChannelKind::Text,
            1 => ChannelKind::Direkt,
            2 => ChannelKind::Voice,
            3 => ChannelKind::Gruppe,
            4 => ChannelKind::Kategorie,
            5 => ChannelKind::News,
            13 => ChannelKind::Stage,
            andere => ChannelKind::Unbekannt(andere),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => 0,
            ChannelKind::Direkt => 1,
            ChannelKind::Voice => 2,
            ChannelKind::Gruppe => 3,
            ChannelKind::Kategorie => 4,
            ChannelKind::News => 5,
            ChannelKind::Stage => 13,
            ChannelKind::Unbekannt(wert) => wert,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub name: String,
    /// `None` wenn der Kanal keine Overwrite-Liste mitliefert
    #[serde(with = "optionale_id_map")]
    pub permission_overwrites: Option<HashMap<OverwriteId, PermissionOverwrite>>,
}

impl Channel {
    pub fn overwrite(&self, id: OverwriteId) -> Option<&PermissionOverwrite> {
        self.permission_overwrites.as_ref()?.get(&id)
    }
}

impl HatId for Channel {
    fn id(&self) -> Snowflake {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Guild
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(with = "id_map")]
    pub roles: HashMap<RoleId, Role>,
    #[serde(with = "id_map")]
    pub channels: HashMap<ChannelId, Channel>,
    #[serde(with = "id_map")]
    pub members: HashMap<UserId, Member>,
}

impl Guild {
    /// Die "everyone"-Rolle traegt die ID der Guild
    pub fn everyone_role(&self) -> Option<&Role> {
        self.roles.get(&self.id)
    }

    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.get(&user_id)
    }

    pub fn channel(&self, channel_id: ChannelId) -> Option<&Channel> {
        self.channels.get(&channel_id)
    }

    /// Rollen eines Mitglieds, "everyone" zuerst, danach nach Position
    ///
    /// Unbekannte Rollen-IDs des Mitglieds werden uebergangen.
    pub fn roles_for(&self, member: &Member) -> Vec<&Role> {
        let mut rollen: Vec<&Role> = member
            .roles
            .iter()
            .filter(|id| **id != self.id)
            .filter_map(|id| self.roles.get(id))
            .collect();
        rollen.sort_by_key(|r| (r.position, r.id));

        let mut ergebnis = Vec::with_capacity(rollen.len() + 1);
        ergebnis.extend(self.everyone_role());
        ergebnis.extend(rollen);
        ergebnis
    }

    /// Effektive Berechtigungen eines Mitglieds in einem Kanal dieser Guild
    pub fn permissions_in(&self, member: &Member, channel_id: ChannelId) -> Option<Permissions> {
        resolver::permissions(member, self.channel(channel_id), self)
    }

    pub fn can_member(&self, member: &Member, required: Permissions, channel_id: ChannelId) -> bool {
        resolver::can_member(member, required, self.channel(channel_id), self)
    }
}

// ---------------------------------------------------------------------------
// Serde-Hilfen: Liste <-> Map nach ID
// ---------------------------------------------------------------------------

mod id_map {
    use std::collections::HashMap;

    use chorus_core::Snowflake;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::HatId;

    pub fn serialize<T, S>(map: &HashMap<Snowflake, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        let mut liste: Vec<(&Snowflake, &T)> = map.iter().collect();
        liste.sort_by_key(|(id, _)| **id);
        serializer.collect_seq(liste.into_iter().map(|(_, wert)| wert))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<HashMap<Snowflake, T>, D::Error>
    where
        T: Deserialize<'de> + HatId,
        D: Deserializer<'de>,
    {
        let liste = Vec::<T>::deserialize(deserializer)?;
        Ok(liste.into_iter().map(|wert| (wert.id(), wert)).collect())
    }
}

mod optionale_id_map {
    use std::collections::HashMap;

    use chorus_core::Snowflake;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::HatId;

    pub fn serialize<T, S>(
        map: &Option<HashMap<Snowflake, T>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match map {
            Some(map) => super::id_map::serialize(map, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<HashMap<Snowflake, T>>, D::Error>
    where
        T: Deserialize<'de> + HatId,
        D: Deserializer<'de>,
    {
        let liste = Option::<Vec<T>>::deserialize(deserializer)?;
        Ok(liste.map(|liste| liste.into_iter().map(|wert| (wert.id(), wert)).collect()))
    }
}
