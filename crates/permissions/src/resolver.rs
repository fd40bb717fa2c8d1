//! Aufloesung effektiver Berechtigungen
//!
//! Reihenfolge: Besitzer, Basis aus Rollen, Administrator, Overwrites fuer
//! "everyone", Rollen und Mitglied, danach implizites Entfernen abhaengiger
//! Berechtigungen.

use crate::models::{Channel, Guild, Member, PermissionOverwrite};
use crate::permissions::Permissions;

/// Effektive Berechtigungen eines Mitglieds
///
/// Liefert `None`, wenn der Kanal fehlt oder keine Overwrite-Map hat
/// (ausser Besitzer und Administratoren, die immer `ALL` erhalten).
pub fn permissions(member: &Member, channel: Option<&Channel>, guild: &Guild) -> Option<Permissions> {
    let user_id = member.user_id();

    if user_id == guild.owner_id {
        tracing::trace!(guild_id = %guild.id, user_id = %user_id, "Besitzer hat alle Berechtigungen");
        return Some(Permissions::ALL);
    }

    let basis = guild
        .roles_for(member)
        .iter()
        .fold(Permissions::empty(), |acc, rolle| acc | rolle.permissions);

    if basis.contains(Permissions::ADMINISTRATOR) {
        tracing::trace!(guild_id = %guild.id, user_id = %user_id, "Administrator");
        return Some(Permissions::ALL);
    }

    let channel = channel?;
    let overwrites = channel.permission_overwrites.as_ref()?;

    let mut effektiv = basis;

    if let Some(everyone) = overwrites.get(&guild.id) {
        effektiv = everyone.anwenden(effektiv);
    }

    let mut rollen_deny = Permissions::empty();
    let mut rollen_allow = Permissions::empty();
    for rolle_id in member.roles.iter().filter(|id| **id != guild.id) {
        if let Some(ow) = overwrites.get(rolle_id) {
            rollen_deny |= ow.deny;
            rollen_allow |= ow.allow;
        }
    }
    effektiv = (effektiv - rollen_deny) | rollen_allow;

    if let Some(ow) = overwrites.get(&user_id) {
        effektiv = ow.anwenden(effektiv);
    }

    if !effektiv.contains(Permissions::SEND_MESSAGES) {
        effektiv -= Permissions::SEND_ABHAENGIG;
    }
    if !effektiv.contains(Permissions::VIEW_CHANNEL) {
        effektiv -= Permissions::ALL_CHANNEL;
    }
    if !channel.kind.ist_sprachfaehig() {
        effektiv -= Permissions::VOICE;
    }

    tracing::trace!(
        guild_id = %guild.id,
        channel_id = %channel.id,
        user_id = %user_id,
        berechtigungen = %effektiv,
        "Berechtigungen aufgeloest"
    );
    Some(effektiv)
}

/// Alle Overwrites des Kanals, die das Mitglied direkt betreffen
///
/// Die Reihenfolge ist nicht festgelegt. Das "everyone"-Overwrite zaehlt nur,
/// wenn das Mitglied die Guild-ID als Rolle fuehrt.
pub fn overwrites<'a>(member: &Member, channel: &'a Channel) -> Vec<&'a PermissionOverwrite> {
    let Some(map) = channel.permission_overwrites.as_ref() else {
        return Vec::new();
    };

    let mut rollen: Vec<&PermissionOverwrite> = member
        .roles
        .iter()
        .filter_map(|id| map.get(id))
        .collect();
    rollen.sort_by_key(|ow| ow.id);

    rollen.extend(map.get(&member.user_id()));
    rollen
}

/// `true` wenn die Aufloesung gelingt und `required` vollstaendig enthaelt
pub fn can_member(
    member: &Member,
    required: Permissions,
    channel: Option<&Channel>,
    guild: &Guild,
) -> bool {
    match permissions(member, channel, guild) {
        Some(effektiv) => effektiv.contains(required),
        None => {
            tracing::debug!(
                guild_id = %guild.id,
                user_id = %member.user_id(),
                "Kanal unbekannt, Berechtigung verweigert"
            );
            false
        }
    }
}
