//! chorus-probe – Einstiegspunkt
//!
//! Aufruf: `chorus-probe [mitschnitt] [ausgabe.pcm]`. Fehlende Argumente
//! kommen aus der Konfiguration (`CHORUS_CONFIG`, Standard `chorus.toml`).

use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::{Context, Result};
use chorus_probe::config::ProbeConfig;
use chorus_probe::probe_ausfuehren;

fn main() -> Result<()> {
    let config_pfad = ProbeConfig::pfad_aus_env();
    let config = ProbeConfig::laden(&config_pfad)?;

    chorus_observability::logging_initialisieren(&config.logging.level, &config.logging.format)?;

    let mut args = std::env::args().skip(1);
    let eingabe_pfad = args
        .next()
        .or_else(|| config.eingabe.datei.clone())
        .context("Kein Mitschnitt angegeben (Argument oder [eingabe].datei)")?;
    let ausgabe_pfad = args
        .next()
        .or_else(|| config.ausgabe.datei.clone())
        .unwrap_or_else(|| format!("{eingabe_pfad}.pcm"));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        eingabe = %eingabe_pfad,
        ausgabe = %ausgabe_pfad,
        "chorus-probe startet"
    );

    let eingabe = File::open(&eingabe_pfad)
        .with_context(|| format!("Mitschnitt '{eingabe_pfad}' nicht lesbar"))?;
    let ausgabe = File::create(&ausgabe_pfad)
        .with_context(|| format!("Ausgabe '{ausgabe_pfad}' nicht anlegbar"))?;

    let bericht = probe_ausfuehren(&config, BufReader::new(eingabe), BufWriter::new(ausgabe))?;

    println!(
        "{} Datagramme, {} dekodiert, {} Luecken, {} veraltet, {} Samples geschrieben",
        bericht.datagramme,
        bericht.decoder.dekodiert,
        bericht.decoder.luecken,
        bericht.decoder.veraltet,
        bericht.samples
    );
    Ok(())
}
