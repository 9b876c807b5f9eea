//! BWF Coding History assembled from the transfer chain.
//!
//! Three EBU R98 lines joined by CRLF: the analogue source, the A/D
//! converter and the capture software. Sample rate and bit depth come from the
//! file's technical metadata.

use crate::bwf::TechMetadata;
use crate::config::AppConfig;

/// Dropdown selections describing the transfer chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferChain {
    /// Short name into the configured `deck` texts.
    pub deck: String,
    /// Short name into the configured `adc` texts.
    pub adc: String,
    /// Short name into the configured `software` texts.
    pub software: String,
    pub media: String,
    pub speed: String,
    pub eq: String,
    pub tape_type: String,
}

impl TransferChain {
    /// First entry of every dropdown, as shown before the user picks anything.
    pub fn initial(config: &AppConfig) -> Self {
        let first = |list: &[String]| list.first().cloned().unwrap_or_default();
        Self {
            deck: config.deck.first().unwrap_or_default().to_string(),
            adc: config.adc.first().unwrap_or_default().to_string(),
            software: config.software.first().unwrap_or_default().to_string(),
            media: first(&config.media),
            speed: first(&config.speed),
            eq: first(&config.eq),
            tape_type: first(&config.tape_type),
        }
    }
}

/// Render the Coding History for `chain`.
///
/// Short names without a configured text render as themselves.
pub fn build(config: &AppConfig, chain: &TransferChain, tech: &TechMetadata) -> String {
    let deck = config.deck.text(&chain.deck).unwrap_or(&chain.deck);
    let adc = config.adc.text(&chain.adc).unwrap_or(&chain.adc);
    let software = config
        .software
        .text(&chain.software)
        .unwrap_or(&chain.software);

    let analogue = [
        deck,
        chain.media.as_str(),
        chain.speed.as_str(),
        chain.eq.as_str(),
        chain.tape_type.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("; ");

    let rate = tech.sample_rate();
    let bits = tech.bit_per_sample();
    [
        format!("A=ANALOGUE,M=stereo,T={analogue}"),
        format!("A=PCM,F={rate},W={bits},M=stereo,T={adc}"),
        format!(
            "A=PCM,F={rate},W={bits},M={},T={software}",
            channel_mode(tech.channels())
        ),
    ]
    .join("\r\n")
}

fn channel_mode(channels: &str) -> String {
    match channels {
        "1" => "mono".to_string(),
        "2" => "stereo".to_string(),
        "" => "stereo".to_string(),
        other => format!("{other}-channel"),
    }
}
