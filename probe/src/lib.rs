//! chorus-probe – Offline-Dekodierung von Voice-Mitschnitten
//!
//! Ein Mitschnitt ist eine Folge von Datensaetzen `[laenge: u16 BE][datagramm]`
//! mit bereits entschluesselten RTP-Datagrammen. Jedes Datagramm laeuft durch
//! den [`SessionDecoder`]; dekodiertes PCM wird als interleaved i16 LE
//! (48 kHz Stereo) geschrieben.

pub mod config;

use std::io::{ErrorKind, Read, Write};

use anyhow::Context;
use chorus_audio::{AudioError, DecoderStatistik, SessionDecoder};
use chorus_protocol::rtp::RtpPacket;

use crate::config::ProbeConfig;

/// Ergebnis eines Probe-Laufs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeBericht {
    /// Gelesene Datensaetze
    pub datagramme: u64,
    /// Zu kurze Datagramme
    pub ungueltig: u64,
    /// Durch den SSRC-Filter uebersprungen
    pub gefiltert: u64,
    /// Geschriebene i16-Samples
    pub samples: u64,
    /// Anzahl verschiedener Quellen im Decoder
    pub quellen: usize,
    pub decoder: DecoderStatistik,
}

/// Liest den naechsten Datensatz; `None` am sauberen Dateiende
///
/// Ein abgeschnittener letzter Datensatz wird protokolliert und wie das
/// Dateiende behandelt.
pub fn datensatz_lesen(eingabe: &mut impl Read) -> anyhow::Result<Option<Vec<u8>>> {
    let mut laenge = [0u8; 2];
    match eingabe.read_exact(&mut laenge) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("Laengenfeld nicht lesbar"),
    }

    let laenge = u16::from_be_bytes(laenge) as usize;
    let mut datagramm = vec![0u8; laenge];
    match eingabe.read_exact(&mut datagramm) {
        Ok(()) => Ok(Some(datagramm)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            tracing::warn!(erwartet = laenge, "Letzter Datensatz abgeschnitten, ignoriert");
            Ok(None)
        }
        Err(e) => Err(e).context("Datagramm nicht lesbar"),
    }
}

/// Dekodiert einen kompletten Mitschnitt
pub fn probe_ausfuehren(
    config: &ProbeConfig,
    mut eingabe: impl Read,
    mut ausgabe: impl Write,
) -> anyhow::Result<ProbeBericht> {
    let mut decoder = SessionDecoder::new(config.codec.clone());
    let mut bericht = ProbeBericht::default();

    while let Some(datagramm) = datensatz_lesen(&mut eingabe)? {
        bericht.datagramme += 1;

        let paket = match RtpPacket::parse(&datagramm) {
            Ok(paket) => paket,
            Err(e) => {
                tracing::debug!(index = bericht.datagramme, fehler = %e, "Datagramm uebersprungen");
                bericht.ungueltig += 1;
                continue;
            }
        };

        if config.eingabe.ssrc.is_some_and(|ssrc| ssrc != paket.ssrc()) {
            bericht.gefiltert += 1;
            continue;
        }

        match decoder.decode(&paket) {
            Ok(dekodiert) => {
                let mut puffer = Vec::with_capacity(dekodiert.samples.len() * 2);
                for sample in &dekodiert.samples {
                    puffer.extend_from_slice(&sample.to_le_bytes());
                }
                ausgabe
                    .write_all(&puffer)
                    .context("PCM-Ausgabe nicht schreibbar")?;
                bericht.samples += dekodiert.samples.len() as u64;
            }
            Err(AudioError::InitialesPaket { .. }) | Err(AudioError::Decode(_)) => {}
            Err(e) => return Err(e).context("Decoder nicht nutzbar"),
        }
    }

    ausgabe.flush().context("PCM-Ausgabe nicht schreibbar")?;
    bericht.quellen = decoder.quellen_anzahl();
    bericht.decoder = decoder.statistik().clone();

    tracing::info!(
        datagramme = bericht.datagramme,
        ungueltig = bericht.ungueltig,
        gefiltert = bericht.gefiltert,
        quellen = bericht.quellen,
        dekodiert = bericht.decoder.dekodiert,
        luecken = bericht.decoder.luecken,
        veraltet = bericht.decoder.veraltet,
        verlust_rate = bericht.decoder.verlust_rate(),
        "Mitschnitt dekodiert"
    );
    Ok(bericht)
}
