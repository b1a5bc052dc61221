//! Line-oriented burst decoding
//!
//! Each input line is one of:
//!
//! ```txt
//! BS_DATA 1 <72 hex digits> [<timestamp ms>]
//! LSN 3 451.125 [456.125]
//! ```
//!
//! Burst lines are decoded and printed. LSN lines replace one
//! entry of the decoder's timeslot frequency table, which takes
//! effect on the next burst. Blank lines and lines beginning
//! with `#` are skipped. Malformed lines are logged and
//! skipped.

use std::io;

use anyhow::{anyhow, Context};
use chrono::{DateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use dmrburst::{
    csbk, lc, span, BitBuffer, BurstBuilder, CsbkOpcode, DataType, DmrDecoder, LcOpcode, Message,
    SyncPattern, TimeslotFrequency, BURST_LENGTH, VOICE_FRAME_BITS,
};

use crate::cli::Args;

lazy_static! {
    static ref BURST_LINE: Regex = Regex::new(
        r"^\s*(?P<sync>[A-Za-z0-9_]+)\s+(?P<ts>[01])\s+(?P<hex>[0-9A-Fa-f]{72})(?:\s+(?P<time>\d+))?\s*$"
    )
    .expect("bad burst regexp");
    static ref LSN_LINE: Regex = Regex::new(
        r"^\s*(?i:LSN)\s+(?P<lsn>\d+)\s+(?P<down>\d+(?:\.\d+)?)(?:\s+(?P<up>\d+(?:\.\d+)?))?\s*$"
    )
    .expect("bad LSN regexp");
    static ref LSN_ARG: Regex =
        Regex::new(r"^(?P<lsn>\d+)=(?P<down>\d+(?:\.\d+)?)(?:,(?P<up>\d+(?:\.\d+)?))?$")
            .expect("bad LSN argument regexp");
}

/// One parsed input line
#[derive(Clone, Debug, PartialEq)]
enum Record {
    Burst {
        sync: SyncPattern,
        timeslot: u8,
        bits: BitBuffer,
        timestamp: Option<u64>,
    },
    Frequency(TimeslotFrequency),
}

/// Run the application
///
/// Decodes every line of `input` with `decoder`, printing each
/// message unless `args` asks for quiet. Stops at the end of
/// input or on a read error.
pub fn run<I>(args: &Args, decoder: &mut DmrDecoder, input: I) -> Result<(), anyhow::Error>
where
    I: Iterator<Item = io::Result<String>>,
{
    for (lineno, line) in input.enumerate() {
        let line = line.with_context(|| format!("unable to read input line {}", lineno + 1))?;

        let record = match parse_line(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(err) => {
                warn!("line {}: {:#}", lineno + 1, err);
                continue;
            }
        };

        match record {
            Record::Frequency(entry) => {
                info!(
                    "LSN {} now {:.6} MHz / {:.6} MHz",
                    entry.number(),
                    entry.downlink_mhz(),
                    entry.uplink_mhz()
                );
                decoder.timeslot_table().update(entry);
            }
            Record::Burst {
                sync,
                timeslot,
                bits,
                timestamp,
            } => {
                let timestamp = timestamp.unwrap_or_else(now_millis);
                match decoder.decode_bits(sync, timeslot, timestamp, bits) {
                    Ok(msg) => report(args, &msg),
                    Err(err) => warn!("line {}: {}", lineno + 1, err),
                }
            }
        }
    }

    Ok(())
}

/// Decode a handful of synthesized bursts
///
/// Exercises the decoder without any input.
pub fn run_demo(args: &Args, decoder: &mut DmrDecoder) -> Result<(), anyhow::Error> {
    warn!("demonstration (--demo) mode: the following messages are NOT LIVE!");

    if decoder.timeslot_table().snapshot().is_empty() {
        decoder
            .timeslot_table()
            .update(TimeslotFrequency::new(3, 451_125_000, 456_125_000));
    }

    let start = now_millis();
    for (i, (sync, timeslot, bits)) in make_demo_bursts()?.into_iter().enumerate() {
        let msg = decoder.decode_bits(sync, timeslot, start + 30 * i as u64, bits)?;
        report(args, &msg);
    }

    Ok(())
}

/// Parse `LSN=DOWN[,UP]` from the command line
pub fn parse_lsn_arg(arg: &str) -> Result<TimeslotFrequency, anyhow::Error> {
    let caps = LSN_ARG
        .captures(arg.trim())
        .ok_or_else(|| anyhow!("expected LSN=DOWNLINK[,UPLINK], got \"{}\"", arg))?;
    frequency_from_captures(&caps)
}

fn report(args: &Args, msg: &Message) {
    if !msg.is_valid() {
        debug!("invalid burst: {}", msg.bits());
    }
    if !args.quiet {
        println!("{} {}", format_timestamp(msg.timestamp()), msg);
    }
}

// None for blank lines and comments
fn parse_line(line: &str) -> Result<Option<Record>, anyhow::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if let Some(caps) = LSN_LINE.captures(line) {
        return Ok(Some(Record::Frequency(frequency_from_captures(&caps)?)));
    }

    let caps = BURST_LINE
        .captures(line)
        .ok_or_else(|| anyhow!("not a burst or LSN record: \"{}\"", line))?;

    let sync = SyncPattern::from_name(caps["sync"].to_ascii_uppercase().as_str());
    if sync == SyncPattern::Unknown && !caps["sync"].eq_ignore_ascii_case("UNKNOWN") {
        debug!("unrecognized sync name \"{}\"", &caps["sync"]);
    }

    let timeslot: u8 = caps["ts"].parse().context("bad timeslot")?;
    let bits = BitBuffer::from_hex_truncated(&caps["hex"], BURST_LENGTH)?;
    let timestamp = match caps.name("time") {
        Some(time) => Some(time.as_str().parse().context("bad timestamp")?),
        None => None,
    };

    Ok(Some(Record::Burst {
        sync,
        timeslot,
        bits,
        timestamp,
    }))
}

fn frequency_from_captures(caps: &regex::Captures<'_>) -> Result<TimeslotFrequency, anyhow::Error> {
    let lsn: u32 = caps["lsn"].parse().context("bad logical slot number")?;
    let downlink = parse_frequency(&caps["down"])?;
    let uplink = match caps.name("up") {
        Some(up) => parse_frequency(up.as_str())?,
        None => downlink,
    };
    Ok(TimeslotFrequency::new(lsn, downlink, uplink))
}

/// Parse a frequency in MHz (with decimal point) or Hz
fn parse_frequency(text: &str) -> Result<u64, anyhow::Error> {
    if text.contains('.') {
        let mhz: f64 = text
            .parse()
            .with_context(|| format!("bad frequency \"{}\"", text))?;
        Ok((mhz * 1_000_000.0).round() as u64)
    } else {
        text.parse()
            .with_context(|| format!("bad frequency \"{}\"", text))
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

fn format_timestamp(ms: u64) -> String {
    let at: Option<DateTime<Utc>> = i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    match at {
        Some(at) => at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => ms.to_string(),
    }
}

// Synthesize bursts for demo mode
fn make_demo_bursts() -> Result<Vec<(SyncPattern, u8, BitBuffer)>, anyhow::Error> {
    let mut out = Vec::new();

    // Connect Plus OTA announcement: type 1, version 2, LSN 3
    let mut ota = csbk::new_block(CsbkOpcode::ConnectPlusOtaAnnouncement);
    ota.set_int(&span::<8>(16), 1)?;
    ota.set_int(&span::<16>(24), 2)?;
    ota.set_int(&span::<5>(63), 4)?;
    csbk::seal(&mut ota)?;
    let burst = BurstBuilder::new(SyncPattern::BaseStationData, 1).build_data(
        1,
        DataType::Csbk,
        &ota,
        0,
    )?;
    out.push((burst.sync(), burst.timeslot(), burst.bits().clone()));

    // group call from 3101234 to talkgroup 31100
    let mut header = lc::new_block(LcOpcode::StandardGroupVoiceChannelUser);
    header.set_int(&span::<24>(24), 31_100)?;
    header.set_int(&span::<24>(48), 3_101_234)?;
    lc::seal(&mut header, DataType::VoiceLcHeader)?;
    let burst = BurstBuilder::new(SyncPattern::BaseStationData, 0).build_data(
        1,
        DataType::VoiceLcHeader,
        &header,
        0,
    )?;
    out.push((burst.sync(), burst.timeslot(), burst.bits().clone()));

    let silence = BitBuffer::zeroed(VOICE_FRAME_BITS);
    let burst = BurstBuilder::new(SyncPattern::BaseStationVoice, 0).build_voice([
        silence.clone(),
        silence.clone(),
        silence,
    ])?;
    out.push((burst.sync(), burst.timeslot(), burst.bits().clone()));

    let burst = BurstBuilder::new(SyncPattern::BaseStationData, 1).build_data(
        1,
        DataType::Idle,
        &BitBuffer::zeroed(96),
        0,
    )?;
    out.push((burst.sync(), burst.timeslot(), burst.bits().clone()));

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;
    use dmrburst::{DmrDecoderBuilder, MessageKind};

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency("451.125").unwrap(), 451_125_000);
        assert_eq!(parse_frequency("451125000").unwrap(), 451_125_000);
        assert_eq!(parse_frequency("0.0125").unwrap(), 12_500);
        assert!(parse_frequency("451.1.25").is_err());
    }

    #[test]
    fn test_parse_lsn() {
        let entry = parse_lsn_arg("3=451.125,456.125").unwrap();
        assert_eq!(entry.number(), 3);
        assert_eq!(entry.downlink_hz(), 451_125_000);
        assert_eq!(entry.uplink_hz(), 456_125_000);

        let entry = parse_lsn_arg("4=451125000").unwrap();
        assert_eq!(entry.uplink_hz(), 451_125_000);

        assert!(parse_lsn_arg("4").is_err());
        assert!(parse_lsn_arg("x=451.125").is_err());

        match parse_line("  lsn 7 452.5 457.5 ").unwrap() {
            Some(Record::Frequency(entry)) => {
                assert_eq!(entry.number(), 7);
                assert_eq!(entry.downlink_hz(), 452_500_000);
                assert_eq!(entry.uplink_hz(), 457_500_000);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_burst_line() {
        let hex = "0".repeat(72);
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("# comment").unwrap(), None);

        match parse_line(&format!("BS_DATA 1 {} 1616554380250", hex)).unwrap() {
            Some(Record::Burst {
                sync,
                timeslot,
                bits,
                timestamp,
            }) => {
                assert_eq!(sync, SyncPattern::BaseStationData);
                assert_eq!(timeslot, 1);
                assert_eq!(bits.len(), BURST_LENGTH);
                assert_eq!(timestamp, Some(1_616_554_380_250));
            }
            _ => unreachable!(),
        }

        match parse_line(&format!("voice_c 0 {}", hex)).unwrap() {
            Some(Record::Burst { sync, timestamp, .. }) => {
                assert_eq!(sync, SyncPattern::VoiceFrameC);
                assert_eq!(timestamp, None);
            }
            _ => unreachable!(),
        }

        match parse_line(&format!("bs_voice_c 1 {}", hex)).unwrap() {
            Some(Record::Burst { sync, .. }) => {
                assert_eq!(sync, SyncPattern::BaseStationVoiceFrameC);
                assert!(sync.has_cach());
            }
            _ => unreachable!(),
        }

        assert!(parse_line("BS_DATA 2 0000").is_err());
        assert!(parse_line(&format!("BS_DATA 1 {}", &hex[1..])).is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(1_616_554_380_250),
            "2021-03-24T02:53:00.250Z"
        );
    }

    #[test]
    fn test_run() {
        let args = Args::try_parse_from(["dmrdec", "-q"]).unwrap();
        let mut decoder = DmrDecoderBuilder::new().build();

        let bursts = make_demo_bursts().unwrap();
        let (sync, ts, bits) = &bursts[0];
        let lines = vec![
            "# test input".to_string(),
            "LSN 3 451.125 456.125".to_string(),
            format!("{} {} {} 1000", sync, ts, bits.to_hex_string()),
            "garbage".to_string(),
        ];

        run(&args, &mut decoder, lines.into_iter().map(Ok)).unwrap();
        assert_eq!(decoder.stats().bursts, 1);
        assert_eq!(decoder.stats().valid, 1);
        assert_eq!(
            decoder.timeslot_table().snapshot().get(3).unwrap().uplink_hz(),
            456_125_000
        );
    }

    #[test]
    fn test_demo_bursts() {
        let mut decoder = DmrDecoderBuilder::new().build();
        let kinds: Vec<MessageKind> = make_demo_bursts()
            .unwrap()
            .into_iter()
            .map(|(sync, ts, bits)| decoder.decode_bits(sync, ts, 0, bits).unwrap().kind().clone())
            .collect();

        assert!(matches!(kinds[0], MessageKind::ConnectPlusOtaAnnouncement(_)));
        assert!(matches!(kinds[1], MessageKind::GroupVoiceChannelUser(_)));
        assert!(matches!(kinds[2], MessageKind::Voice(_)));
        assert_eq!(kinds[3], MessageKind::Idle);
        assert_eq!(decoder.stats().invalid, 0);
    }
}
