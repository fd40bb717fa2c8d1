//! chorus-permissions – Berechtigungsaufloesung
//!
//! Berechnet die effektiven Berechtigungen eines Guild-Mitglieds aus Rollen,
//! Kanal-Overwrites und impliziten Entzuegen. Arbeitet nur auf
//! Schnappschuessen, ohne I/O und ohne Mutation.

pub mod models;
pub mod permissions;
pub mod resolver;

pub use models::{
    Channel, ChannelKind, Guild, HatId, Member, OverwriteType, PermissionOverwrite, Role, User,
};
pub use permissions::Permissions;
pub use resolver::{can_member, overwrites, permissions};
