//! Integrationstest: Guild aus JSON laden und Berechtigungen aufloesen

use std::collections::HashSet;

use chorus_core::Snowflake;
use chorus_permissions::{overwrites, Guild, Permissions};

const GUILD_JSON: &str = r#"{
    "id": "1000",
    "name": "Stammtisch",
    "owner_id": "1",
    "roles": [
        {"id": "1000", "name": "@everyone", "permissions": "104324673", "position": 0},
        {"id": "2000", "name": "Moderation", "permissions": "8192", "position": 2},
        {"id": "2001", "name": "Stumm", "permissions": 0, "position": 1},
        {"id": "2002", "name": "Admin", "permissions": "8", "position": 3}
    ],
    "channels": [
        {
            "id": "3000", "type": 0, "name": "allgemein",
            "permission_overwrites": [
                {"id": "1000", "type": "role", "allow": "0", "deny": "2048"},
                {"id": "2000", "type": "role", "allow": "2048", "deny": "0"}
            ]
        },
        {
            "id": "3001", "type": 2, "name": "Lobby",
            "permission_overwrites": [
                {"id": "2001", "type": "role", "allow": "0", "deny": "2097152"},
                {"id": "12", "type": "member", "allow": "2097152", "deny": "0"}
            ]
        },
        {"id": "3002", "type": 4, "name": "Kategorie"}
    ],
    "members": [
        {"user": {"id": "1", "username": "besitzer"}, "roles": []},
        {"user": {"id": "10", "username": "gast"}, "roles": []},
        {"user": {"id": "11", "username": "moderator"}, "roles": ["2000"]},
        {"user": {"id": "12", "username": "ausnahme"}, "roles": ["2001"]},
        {"user": {"id": "13", "username": "stumm"}, "roles": ["2001"]},
        {"user": {"id": "14", "username": "admin"}, "roles": ["2002"]}
    ]
}"#;

fn guild() -> Guild {
    serde_json::from_str(GUILD_JSON).unwrap()
}

#[test]
fn guild_wird_geladen() {
    let g = guild();
    assert_eq!(g.roles.len(), 4);
    assert_eq!(g.channels.len(), 3);
    assert_eq!(g.members.len(), 6);
    assert_eq!(g.everyone_role().unwrap().name, "@everyone");
    assert_eq!(g.roles_for(g.member(Snowflake(11)).unwrap()).len(), 2);
}

#[test]
fn besitzer_und_admin() {
    let g = guild();
    let besitzer = g.member(Snowflake(1)).unwrap();
    let admin = g.member(Snowflake(14)).unwrap();

    assert_eq!(g.permissions_in(besitzer, Snowflake(3002)), Some(Permissions::ALL));
    assert_eq!(g.permissions_in(admin, Snowflake(9999)), Some(Permissions::ALL));
}

#[test]
fn everyone_darf_nicht_schreiben() {
    let g = guild();
    let gast = g.member(Snowflake(10)).unwrap();
    let p = g.permissions_in(gast, Snowflake(3000)).unwrap();

    assert!(p.contains(Permissions::VIEW_CHANNEL));
    assert!(!p.contains(Permissions::SEND_MESSAGES));
    assert!(!p.intersects(Permissions::SEND_ABHAENGIG));
    assert!(!p.intersects(Permissions::VOICE));
}

#[test]
fn moderation_darf_wieder_schreiben() {
    let g = guild();
    let moderator = g.member(Snowflake(11)).unwrap();
    assert!(g.can_member(moderator, Permissions::SEND_MESSAGES, Snowflake(3000)));
    assert!(g.can_member(moderator, Permissions::MANAGE_MESSAGES, Snowflake(3000)));
}

#[test]
fn sprechen_im_sprachkanal() {
    let g = guild();
    let gast = g.member(Snowflake(10)).unwrap();
    let stumm = g.member(Snowflake(13)).unwrap();
    let ausnahme = g.member(Snowflake(12)).unwrap();

    assert!(g.can_member(gast, Permissions::CONNECT | Permissions::SPEAK, Snowflake(3001)));
    assert!(g.can_member(stumm, Permissions::CONNECT, Snowflake(3001)));
    assert!(!g.can_member(stumm, Permissions::SPEAK, Snowflake(3001)));
    assert!(g.can_member(ausnahme, Permissions::SPEAK, Snowflake(3001)));

    let ids: HashSet<u64> = overwrites(ausnahme, g.channel(Snowflake(3001)).unwrap())
        .iter()
        .map(|o| o.id.0)
        .collect();
    assert_eq!(ids, HashSet::from([2001, 12]));
}

#[test]
fn kanal_ohne_overwrites_oder_unbekannt() {
    let g = guild();
    let gast = g.member(Snowflake(10)).unwrap();

    assert_eq!(g.permissions_in(gast, Snowflake(3002)), None);
    assert_eq!(g.permissions_in(gast, Snowflake(4242)), None);
    assert!(!g.can_member(gast, Permissions::VIEW_CHANNEL, Snowflake(4242)));
}

#[test]
fn berechtigungen_als_string_zurueck() {
    let g = guild();
    let json = serde_json::to_value(&g).unwrap();
    let everyone = json["roles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == "1000")
        .unwrap();
    assert_eq!(everyone["permissions"], "104324673");

    let wieder: Guild = serde_json::from_value(json).unwrap();
    assert_eq!(wieder, g);
}
