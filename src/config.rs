use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "lavalamp")]
#[command(about = "Metaball lava lamp for the terminal", long_about = None)]
pub(crate) struct Args {
    /// FPS cap; one physics tick runs per frame
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// PRNG seed for a reproducible lamp
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// heater setting, 0..100 (10 or below switches the lamp off)
    #[arg(long)]
    pub(crate) heat: Option<f64>,

    /// wax viscosity, 1..10
    #[arg(long)]
    pub(crate) viscosity: Option<f64>,

    /// motion and rendering smoothness, 1..10
    #[arg(long)]
    pub(crate) smoothness: Option<f64>,

    /// flow speed, 1..10
    #[arg(long)]
    pub(crate) speed: Option<f64>,

    /// classic three-colour wax instead of the psychedelic palette
    #[arg(long, default_value_t = false)]
    pub(crate) classic: bool,

    /// do not cycle colours over time
    #[arg(long, default_value_t = false)]
    pub(crate) no_cycle: bool,

    /// start with the heater paused
    #[arg(long, default_value_t = false)]
    pub(crate) paused: bool,

    /// hide the status line
    #[arg(long, default_value_t = false)]
    pub(crate) no_hud: bool,

    /// run N ticks without a terminal and print a summary
    #[arg(long, value_name = "FRAMES")]
    pub(crate) headless: Option<u64>,

    /// write tracing output to this file (filter with RUST_LOG)
    #[arg(long, value_name = "FILE")]
    pub(crate) log: Option<PathBuf>,

    /// do not read or write the settings file
    #[arg(long, default_value_t = false)]
    pub(crate) no_save: bool,
}

/// Everything the simulation reads from the control surface. A copy is
/// taken at the start of each tick; edits land on the next one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Params {
    pub(crate) heat: f64,
    pub(crate) viscosity: f64,
    pub(crate) smoothness: f64,
    pub(crate) speed: f64,
    pub(crate) is_on: bool,
    pub(crate) psychedelic: bool,
    pub(crate) color_cycle: bool,
    pub(crate) particle_density: f64,
    pub(crate) visual_quality: f64,
    pub(crate) bloom_intensity: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            heat: 60.0,
            viscosity: 5.0,
            smoothness: 8.0,
            speed: 5.0,
            is_on: true,
            psychedelic: true,
            color_cycle: true,
            particle_density: 6.0,
            visual_quality: 8.0,
            bloom_intensity: 7.0,
        }
    }
}

pub(crate) const HEAT_RANGE: (f64, f64) = (0.0, 100.0);
pub(crate) const KNOB_RANGE: (f64, f64) = (1.0, 10.0);
/// At or below this heater setting the lamp is considered switched off.
pub(crate) const HEAT_ON_THRESHOLD: f64 = 10.0;

fn knob(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(KNOB_RANGE.0, KNOB_RANGE.1)
    } else {
        KNOB_RANGE.0
    }
}

impl Params {
    pub(crate) fn clamped(self) -> Self {
        let heat = if self.heat.is_finite() {
            self.heat.clamp(HEAT_RANGE.0, HEAT_RANGE.1)
        } else {
            Params::default().heat
        };
        Self {
            heat,
            viscosity: knob(self.viscosity),
            smoothness: knob(self.smoothness),
            speed: knob(self.speed),
            particle_density: knob(self.particle_density),
            visual_quality: knob(self.visual_quality),
            bloom_intensity: knob(self.bloom_intensity),
            ..self
        }
    }

    /// Heater dial: moving it also flips the lamp on or off.
    pub(crate) fn set_heat(&mut self, heat: f64) {
        self.heat = heat.clamp(HEAT_RANGE.0, HEAT_RANGE.1);
        self.is_on = self.heat > HEAT_ON_THRESHOLD;
    }

    /// True when both the palette and the cycling are enabled.
    pub(crate) fn psychedelic_colors(&self) -> bool {
        self.psychedelic && self.color_cycle
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) params: Params,
    pub(crate) fps_cap: u32,
    pub(crate) seed: u64,
    pub(crate) theme: usize,
    pub(crate) show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            params: Params::default(),
            fps_cap: 60,
            seed: 0x1A7A_u64,
            theme: 0,
            show_hud: true,
        }
    }
}

impl Settings {
    /// Command-line flags win over whatever was loaded from disk.
    pub(crate) fn apply_args(&mut self, args: &Args) {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(heat) = args.heat {
            self.params.set_heat(heat);
        }
        if let Some(v) = args.viscosity {
            self.params.viscosity = v;
        }
        if let Some(v) = args.smoothness {
            self.params.smoothness = v;
        }
        if let Some(v) = args.speed {
            self.params.speed = v;
        }
        if args.classic {
            self.params.psychedelic = false;
        }
        if args.no_cycle {
            self.params.color_cycle = false;
        }
        if args.paused {
            self.params.is_on = false;
        }
        if args.no_hud {
            self.show_hud = false;
        }
        self.params = self.params.clamped();
        self.fps_cap = self.fps_cap.clamp(10, 240);
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "terminal-toys", "LavaLamp")
        .context("could not resolve project directories")?;
    let dir = proj.config_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create config dir {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Settings::default(),
    };
    match serde_json::from_str::<Settings>(&raw) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable settings, using defaults");
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    clear_rename_target(path)?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Unix `rename` replaces the target in one step; Windows refuses to.
#[cfg(windows)]
fn clear_rename_target(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
            Err(err).with_context(|| format!("removing old {}", path.display()))
        }
        _ => Ok(()),
    }
}

#[cfg(not(windows))]
fn clear_rename_target(_path: &Path) -> Result<()> {
    Ok(())
}
