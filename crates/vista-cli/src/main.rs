// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vista CLI
//!
//! Developer tooling for Vista viewports: list scene profiles, probe a
//! profile headlessly against assets on disk, and manage saved prefs.

mod probe;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use tracing_subscriber::EnvFilter;
use vista_app_core::config::ConfigService;
use vista_app_core::config_port::ConfigPort;
use vista_app_core::prefs::ViewportPrefs;
use vista_config_fs::FsConfigStore;
use vista_viewport::{EnvironmentSetup, SceneProfile};

use crate::probe::{ProbeOptions, ProbeReport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Vista viewport developer CLI")]
struct Args {
    /// Directory holding saved prefs (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in scene profiles
    Profiles,
    /// Mount a profile headlessly, run frames, unmount, and report
    Probe {
        /// Profile name
        #[arg(long, default_value = "skinning-morphing")]
        profile: String,
        /// Directory asset URLs resolve against
        #[arg(long, default_value = ".")]
        assets: PathBuf,
        /// Container width
        #[arg(long, default_value_t = 800)]
        width: u32,
        /// Container height
        #[arg(long, default_value_t = 600)]
        height: u32,
        /// Frames to run after mount
        #[arg(long, default_value_t = 60)]
        frames: u32,
        /// Simulated milliseconds per frame
        #[arg(long, default_value_t = 16)]
        frame_ms: u64,
        /// Resize the container halfway through (WIDTHxHEIGHT)
        #[arg(long, value_parser = parse_size)]
        resize: Option<(u32, u32)>,
        /// Emit trace/info diagnostics
        #[arg(long, short)]
        verbose: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Exit non-zero when any error was reported
        #[arg(long)]
        strict: bool,
    },
    /// Show or edit saved viewport prefs
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the saved prefs (defaults when none are saved)
    Show,
    /// Update saved prefs
    Set {
        /// Emit trace/info diagnostics
        #[arg(long)]
        log_enable: Option<bool>,
        /// Draco decoder location
        #[arg(long)]
        draco_decoder_path: Option<String>,
        /// Prefix for relative asset paths
        #[arg(long)]
        asset_base: Option<String>,
    },
    /// Print where prefs are stored
    Path,
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("width: {e}"))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "vista=trace" } else { "vista=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn config_service(config_dir: Option<&PathBuf>) -> Result<ConfigService<FsConfigStore>> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    }
    .context("opening config store")?;
    Ok(ConfigService::new(store))
}

fn load_prefs(config_dir: Option<&PathBuf>) -> Result<ViewportPrefs> {
    let mut prefs = config_service(config_dir)?
        .load_prefs()
        .unwrap_or_default();
    prefs.apply_env(|key| std::env::var(key).ok());
    Ok(prefs)
}

fn profiles_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["profile", "model", "environment", "draco"]);
    for name in SceneProfile::NAMES {
        let Some(profile) = SceneProfile::by_name(name) else {
            continue;
        };
        let environment = match &profile.environment {
            EnvironmentSetup::Room { sigma } => format!("room (sigma {sigma})"),
            EnvironmentSetup::Hdr { url, .. } => url.clone(),
        };
        table.add_row(vec![
            name.to_owned(),
            profile.model.url.clone(),
            environment,
            profile.draco_decoder_path.clone().unwrap_or_else(|| "-".into()),
        ]);
    }
    table
}

fn report_table(report: &ProbeReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["field", "value"]);
    let rows = [
        ("profile", report.profile.clone()),
        ("model", report.model_url.clone()),
        ("loop", report.loop_state.clone()),
        ("frames", report.frames.to_string()),
        ("nodes", report.nodes.to_string()),
        ("model loaded", report.model_loaded.to_string()),
        (
            "active clip",
            report.active_clip.clone().unwrap_or_else(|| "-".into()),
        ),
        ("background", report.background.clone()),
        (
            "renderer",
            format!("{}x{}", report.renderer_size.0, report.renderer_size.1),
        ),
        ("aspect", format!("{:.3}", report.aspect)),
        ("warnings", report.warnings.to_string()),
        ("errors", report.errors.to_string()),
        ("clean teardown", report.torn_down_cleanly.to_string()),
    ];
    for (field, value) in rows {
        table.add_row(vec![field.to_owned(), value]);
    }
    table
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut out = std::io::stdout().lock();

    match args.cmd {
        Command::Profiles => {
            writeln!(out, "{}", profiles_table())?;
        }
        Command::Probe {
            profile,
            assets,
            width,
            height,
            frames,
            frame_ms,
            resize,
            verbose,
            json,
            strict,
        } => {
            let prefs = load_prefs(args.config_dir.as_ref())?;
            let verbose = verbose || prefs.log_enable;
            init_tracing(verbose)?;
            let report = probe::run(&ProbeOptions {
                profile,
                assets,
                width,
                height,
                frames,
                frame_ms,
                resize,
                verbose,
                prefs,
            })?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                writeln!(out, "{}", report_table(&report))?;
            }
            if strict && report.errors > 0 {
                bail!("{} error(s) reported during probe", report.errors);
            }
        }
        Command::Prefs { action } => {
            let service = config_service(args.config_dir.as_ref())?;
            match action {
                PrefsAction::Show => {
                    let prefs = service.load_prefs().unwrap_or_default();
                    writeln!(out, "{}", serde_json::to_string_pretty(&prefs)?)?;
                }
                PrefsAction::Set {
                    log_enable,
                    draco_decoder_path,
                    asset_base,
                } => {
                    let mut prefs = service.load_prefs().unwrap_or_default();
                    if let Some(flag) = log_enable {
                        prefs.log_enable = flag;
                    }
                    if draco_decoder_path.is_some() {
                        prefs.draco_decoder_path = draco_decoder_path;
                    }
                    if asset_base.is_some() {
                        prefs.asset_base = asset_base;
                    }
                    service
                        .save(vista_app_core::config_port::PREFS_KEY, &prefs)
                        .context("saving prefs")?;
                    writeln!(out, "{}", serde_json::to_string_pretty(&prefs)?)?;
                }
                PrefsAction::Path => {
                    writeln!(out, "{}", service.store().base().display())?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_parse() {
        assert_eq!(parse_size("400x300"), Ok((400, 300)));
        assert_eq!(parse_size("1920X1080"), Ok((1920, 1080)));
        assert!(parse_size("400").is_err());
        assert!(parse_size("ax3").is_err());
    }

    #[test]
    fn profiles_table_lists_every_profile() {
        let rendered = profiles_table().to_string();
        assert!(rendered.contains("keyframes"));
        assert!(rendered.contains("skinning-morphing"));
        assert!(rendered.contains("LittlestTokyo.glb"));
    }

    #[test]
    fn cli_parses_probe_flags() {
        let args = Args::try_parse_from([
            "vista", "probe", "--profile", "keyframes", "--frames", "3", "--resize", "10x20",
        ])
        .map_err(|e| e.to_string());
        assert!(matches!(
            args,
            Ok(Args {
                cmd: Command::Probe {
                    frames: 3,
                    resize: Some((10, 20)),
                    ..
                },
                ..
            })
        ));
    }
}
