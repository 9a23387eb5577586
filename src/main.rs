mod error;
mod frametypes;
mod inject;
mod modulation;
mod pcap;
mod rawsocks;
mod tx;
mod util;

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::{debug, info, warn};
use nix::unistd::geteuid;
use strum::IntoEnumIterator;

use crate::frametypes::{entries_of, FrameType};
use crate::inject::Injector;
use crate::modulation::{ModulationProfile, MODULATIONS};
use crate::pcap::FrameRecorder;
use crate::tx::{build_test_frames, FrameContext, TestFrame};
use crate::util::MacAddress;

#[derive(Parser)]
#[command(name = "captest")]
#[command(author = "Ryan Butler (Ragnt)")]
#[command(
    about = "Injects every 802.11 frame subtype at every modulation to test monitor-mode capture.",
    long_about = None
)]
#[command(version)]
struct Arguments {
    #[arg(short, long, default_value = "mon0")]
    /// Monitor-mode interface to inject on.
    interface: String,

    #[arg(short, long, default_value = modulation::ALL)]
    /// Modulation profile to use, or ALL.
    modulation: String,

    #[arg(short, long)]
    /// Print available modulations and frame types, then exit.
    display: bool,

    #[arg(short, long, default_value_t = MacAddress::default())]
    /// Source / BSSID address stamped on every frame.
    source: MacAddress,

    #[arg(long, default_value_t = 50)]
    /// Delay between frames, in milliseconds.
    interval: u64,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    /// Number of times to send the full set.
    rounds: u32,

    #[arg(short, long)]
    /// Optional - Record the frames to <OUTPUT>-<date>.pcap.
    output: Option<String>,

    #[arg(long)]
    /// Build (and record) the frames without transmitting.
    dry_run: bool,

    #[arg(short, long)]
    /// List each selected profile's encoding and every frame.
    verbose: bool,
}

/// The `-d` listing: modulation names, then the frame type table.
fn catalog() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Available modulations are...");
    let _ = writeln!(out, "\t{} (default)", modulation::ALL);
    for profile in MODULATIONS.iter() {
        let _ = writeln!(out, "\t{}", profile.name);
    }

    let _ = writeln!(out, "\n Table of 802.11 Frame Types");
    let _ = writeln!(
        out,
        "{:4} - {:7}  {:29} {}",
        "Type", "Subtype", "Name", "Wireshark Display Filter"
    );
    for frame_type in FrameType::iter() {
        let _ = writeln!(out, "{}", "-".repeat(76));
        for entry in entries_of(frame_type) {
            let _ = writeln!(
                out,
                "{:3} {:6}      {:29} {}",
                frame_type.code(),
                entry.subtype,
                entry.name,
                entry.display_filter()
            );
        }
    }
    out
}

fn print_profiles(heading: &str, profiles: &[&ModulationProfile]) {
    println!("{}", heading);
    for profile in profiles {
        println!(
            "\t{:12} {} [{}]",
            profile.name,
            profile.describe(),
            hex::encode(profile.radiotap())
        );
    }
}

fn print_frames(frames: &[TestFrame]) {
    for (idx, frame) in frames.iter().enumerate() {
        println!(
            "{:5} {:12} {:10} {:2} {:29} {} bytes",
            idx + 1,
            frame.modulation,
            frame.frame_type,
            frame.subtype,
            frame.name,
            frame.bytes.len()
        );
    }
}

fn record(prefix: &str, frames: &[TestFrame]) -> anyhow::Result<()> {
    let (mut recorder, filename) =
        FrameRecorder::create(prefix).with_context(|| format!("creating {}", prefix))?;
    for frame in frames {
        recorder
            .record(&frame.bytes)
            .with_context(|| format!("writing {}", filename))?;
    }
    let written = recorder.written();
    recorder
        .finish()
        .with_context(|| format!("flushing {}", filename))?;
    println!("💲 Recorded {} frames to {}", written, filename);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Arguments::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if cli.display {
        print!("{}", catalog());
        return Ok(());
    }

    let profiles = modulation::select(&cli.modulation)?;
    if cli.verbose {
        print_profiles("Available modulations are...", &MODULATIONS.iter().collect::<Vec<_>>());
    }
    print_profiles("Selected modulation(s) are...", &profiles);

    if cli.source.is_broadcast() {
        warn!("Source address is broadcast; receivers may drop these frames");
    }

    let ctx = FrameContext::new(&cli.interface, cli.source);
    let frames = build_test_frames(&ctx, &profiles).context("building test frames")?;
    info!(
        "Built {} frames ({} modulation(s) x {} subtypes)",
        frames.len(),
        profiles.len(),
        frametypes::injectable().count()
    );
    if cli.verbose {
        print_frames(&frames);
    }

    if let Some(prefix) = &cli.output {
        record(prefix, &frames)?;
    }

    if cli.dry_run {
        println!("💲 Dry run, nothing sent.");
        return Ok(());
    }

    if !geteuid().is_root() {
        bail!("You need to run as root to open a raw socket on {}", cli.interface);
    }

    let injector = Injector::open(&cli.interface)
        .with_context(|| format!("opening injection socket on {}", cli.interface))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    println!(
        "💲 Injecting {} frames on {} ({} round(s), {} ms apart)",
        frames.len(),
        cli.interface,
        cli.rounds,
        cli.interval
    );
    let start_time = Instant::now();
    let stats = injector
        .send_all(
            &frames,
            Duration::from_millis(cli.interval),
            cli.rounds,
            &running,
        )
        .with_context(|| format!("injecting on {}", cli.interface))?;
    debug!("{:?}", stats);

    println!(
        "💲 Sent {}/{} frames ({} bytes) in {:.1}s",
        stats.sent,
        stats.attempted,
        stats.bytes,
        start_time.elapsed().as_secs_f64()
    );
    if !running.load(Ordering::SeqCst) {
        println!("💲 Interrupted before all frames were sent.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Arguments::try_parse_from(["captest"]).unwrap();
        assert_eq!(cli.interface, "mon0");
        assert_eq!(cli.modulation, "ALL");
        assert_eq!(cli.source, MacAddress::default());
        assert_eq!(cli.interval, 50);
        assert_eq!(cli.rounds, 1);
        assert!(!cli.display && !cli.dry_run && !cli.verbose);
        assert!(cli.output.is_none());
    }

    #[test]
    fn cli_flags() {
        let cli = Arguments::try_parse_from([
            "captest", "-i", "wlan1", "-m", "VHT92SS", "-s", "02:00:00:00:00:01", "--rounds",
            "3", "-o", "run", "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.interface, "wlan1");
        assert_eq!(cli.modulation, "VHT92SS");
        assert_eq!(cli.source.0, [2, 0, 0, 0, 0, 1]);
        assert_eq!(cli.rounds, 3);
        assert_eq!(cli.output.as_deref(), Some("run"));
        assert!(cli.dry_run);
    }

    #[test]
    fn cli_rejects_bad_input() {
        assert!(Arguments::try_parse_from(["captest", "-s", "zz:00"]).is_err());
        assert!(Arguments::try_parse_from(["captest", "--rounds", "0"]).is_err());
    }

    #[test]
    fn catalog_lists_modulations_then_frame_types() {
        let text = catalog();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Available modulations are...");
        assert_eq!(lines[1], "\tALL (default)");
        assert_eq!(lines[2], "\tabg");
        assert_eq!(lines[18], "\tHE");
        assert_eq!(lines[20], " Table of 802.11 Frame Types");
        assert!(lines[21].starts_with("Type - Subtype  Name"));
        assert_eq!(lines[22], "-".repeat(76));
        assert_eq!(
            lines[23],
            format!("{:3} {:6}      {:29} {}", 0, 0, "Association Request", "wlan.fc.type_subtype == 0x0000")
        );
        assert!(text.contains("wlan.fc.type_subtype == 0x0031"));
        // one separator per frame type
        assert_eq!(lines.iter().filter(|l| l.starts_with("----")).count(), 4);
    }
}
