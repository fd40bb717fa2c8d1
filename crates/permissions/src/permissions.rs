//! Berechtigungs-Bitset
//!
//! 64-Bit-Maske der Plattform. Wird im JSON als Dezimal-String uebertragen,
//! beim Lesen werden auch Zahlen akzeptiert.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not, Sub, SubAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Menge von Berechtigungen
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions(u64);

impl Permissions {
    pub const CREATE_INSTANT_INVITE: Self = Self(1 << 0);
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const ADD_REACTIONS: Self = Self(1 << 6);
    pub const VIEW_AUDIT_LOG: Self = Self(1 << 7);
    pub const PRIORITY_SPEAKER: Self = Self(1 << 8);
    pub const STREAM: Self = Self(1 << 9);
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const SEND_TTS_MESSAGES: Self = Self(1 << 12);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const EMBED_LINKS: Self = Self(1 << 14);
    pub const ATTACH_FILES: Self = Self(1 << 15);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);
    pub const MENTION_EVERYONE: Self = Self(1 << 17);
    pub const USE_EXTERNAL_EMOJIS: Self = Self(1 << 18);
    pub const VIEW_GUILD_INSIGHTS: Self = Self(1 << 19);
    pub const CONNECT: Self = Self(1 << 20);
    pub const SPEAK: Self = Self(1 << 21);
    pub const MUTE_MEMBERS: Self = Self(1 << 22);
    pub const DEAFEN_MEMBERS: Self = Self(1 << 23);
    pub const MOVE_MEMBERS: Self = Self(1 << 24);
    pub const USE_VAD: Self = Self(1 << 25);
    pub const CHANGE_NICKNAME: Self = Self(1 << 26);
    pub const MANAGE_NICKNAMES: Self = Self(1 << 27);
    pub const MANAGE_ROLES: Self = Self(1 << 28);
    pub const MANAGE_WEBHOOKS: Self = Self(1 << 29);
    pub const MANAGE_EMOJIS_AND_STICKERS: Self = Self(1 << 30);
    pub const USE_SLASH_COMMANDS: Self = Self(1 << 31);
    pub const REQUEST_TO_SPEAK: Self = Self(1 << 32);
    pub const MANAGE_THREADS: Self = Self(1 << 34);
    pub const USE_PUBLIC_THREADS: Self = Self(1 << 35);
    pub const USE_PRIVATE_THREADS: Self = Self(1 << 36);
    pub const USE_EXTERNAL_STICKERS: Self = Self(1 << 37);

    /// Alle kanalbezogenen Berechtigungen
    pub const ALL_CHANNEL: Self = Self(0x33F7_FC51);
    /// Alle Sprachkanal-Berechtigungen (CONNECT bis USE_VAD)
    pub const VOICE: Self = Self(0x03F0_0000);
    /// Vollstaendige Menge (Besitzer, Administrator)
    pub const ALL: Self = Self(u64::MAX);

    /// Haengen an SEND_MESSAGES und entfallen ohne sie
    pub const SEND_ABHAENGIG: Self = Self(
        Self::SEND_TTS_MESSAGES.0
            | Self::MENTION_EVERYONE.0
            | Self::ATTACH_FILES.0
            | Self::EMBED_LINKS.0,
    );

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// `true` wenn alle Bits von `other` gesetzt sind
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Namen aller gesetzten Einzel-Berechtigungen (fuer Logs)
    pub fn namen(&self) -> Vec<&'static str> {
        BENANNTE
            .iter()
            .filter(|(_, p)| self.contains(*p))
            .map(|(name, _)| *name)
            .collect()
    }
}

const BENANNTE: &[(&str, Permissions)] = &[
    ("CREATE_INSTANT_INVITE", Permissions::CREATE_INSTANT_INVITE),
    ("KICK_MEMBERS", Permissions::KICK_MEMBERS),
    ("BAN_MEMBERS", Permissions::BAN_MEMBERS),
    ("ADMINISTRATOR", Permissions::ADMINISTRATOR),
    ("MANAGE_CHANNELS", Permissions::MANAGE_CHANNELS),
    ("MANAGE_GUILD", Permissions::MANAGE_GUILD),
    ("ADD_REACTIONS", Permissions::ADD_REACTIONS),
    ("VIEW_AUDIT_LOG", Permissions::VIEW_AUDIT_LOG),
    ("PRIORITY_SPEAKER", Permissions::PRIORITY_SPEAKER),
    ("STREAM", Permissions::STREAM),
    ("VIEW_CHANNEL", Permissions::VIEW_CHANNEL),
    ("SEND_MESSAGES", Permissions::SEND_MESSAGES),
    ("SEND_TTS_MESSAGES", Permissions::SEND_TTS_MESSAGES),
    ("MANAGE_MESSAGES", Permissions::MANAGE_MESSAGES),
    ("EMBED_LINKS", Permissions::EMBED_LINKS),
    ("ATTACH_FILES", Permissions::ATTACH_FILES),
    ("READ_MESSAGE_HISTORY", Permissions::READ_MESSAGE_HISTORY),
    ("MENTION_EVERYONE", Permissions::MENTION_EVERYONE),
    ("USE_EXTERNAL_EMOJIS", Permissions::USE_EXTERNAL_EMOJIS),
    ("VIEW_GUILD_INSIGHTS", Permissions::VIEW_GUILD_INSIGHTS),
    ("CONNECT", Permissions::CONNECT),
    ("SPEAK", Permissions::SPEAK),
    ("MUTE_MEMBERS", Permissions::MUTE_MEMBERS),
    ("DEAFEN_MEMBERS", Permissions::DEAFEN_MEMBERS),
    ("MOVE_MEMBERS", Permissions::MOVE_MEMBERS),
    ("USE_VAD", Permissions::USE_VAD),
    ("CHANGE_NICKNAME", Permissions::CHANGE_NICKNAME),
    ("MANAGE_NICKNAMES", Permissions::MANAGE_NICKNAMES),
    ("MANAGE_ROLES", Permissions::MANAGE_ROLES),
    ("MANAGE_WEBHOOKS", Permissions::MANAGE_WEBHOOKS),
    ("MANAGE_EMOJIS_AND_STICKERS", Permissions::MANAGE_EMOJIS_AND_STICKERS),
    ("USE_SLASH_COMMANDS", Permissions::USE_SLASH_COMMANDS),
    ("REQUEST_TO_SPEAK", Permissions::REQUEST_TO_SPEAK),
    ("MANAGE_THREADS", Permissions::MANAGE_THREADS),
    ("USE_PUBLIC_THREADS", Permissions::USE_PUBLIC_THREADS),
    ("USE_PRIVATE_THREADS", Permissions::USE_PRIVATE_THREADS),
    ("USE_EXTERNAL_STICKERS", Permissions::USE_EXTERNAL_STICKERS),
];

// ---------------------------------------------------------------------------
// Operatoren
// ---------------------------------------------------------------------------

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Permissions {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Mengendifferenz
impl Sub for Permissions {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl SubAssign for Permissions {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 &= !rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Serialisierung
// ---------------------------------------------------------------------------

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("eine Berechtigungsmaske als String oder Zahl")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Permissions, E> {
                Ok(Permissions(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Permissions, E> {
                u64::try_from(v)
                    .map(Permissions)
                    .map_err(|_| E::custom(format!("negative Berechtigungsmaske: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Permissions, E> {
                v.parse::<u64>()
                    .map(Permissions)
                    .map_err(|_| E::custom(format!("ungueltige Berechtigungsmaske: '{v}'")))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}
