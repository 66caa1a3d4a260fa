use crate::bounds::Geometry;
use crate::color::{theme_for, THEMES};
use crate::config::{load_settings, project_paths, save_settings_atomic, Args, Paths, Settings};
use crate::input::{collect_input_nonblocking, map_key, Action, Knob};
use crate::lamp::Lamp;
use crate::population::TickReport;
use crate::render::{compose, draw_hud, status_line, Terminal, View};
use anyhow::Context;
use std::time::{Duration, Instant};

/// Terminal size the headless run pretends to have.
const HEADLESS_VIEW: (u16, u16) = (100, 40);

pub(crate) struct App {
    settings: Settings,
    term: Terminal,
    view: View,
    lamp: Lamp,
    should_quit: bool,
    fps: f32,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let term = Terminal::begin()?;
        let view = View::fit(term.cols, term.rows, &Geometry::default());
        let (w, h) = view.world_size();
        let lamp = Lamp::new(settings.seed, w, h, &settings.params);
        tracing::info!(cols = term.cols, rows = term.rows, zoom = view.zoom, seed = settings.seed, "lamp started");

        Ok(Self {
            fps: settings.fps_cap as f32,
            settings,
            term,
            view,
            lamp,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps_cap as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();

            if self.term.resize_if_needed()? {
                self.view = View::fit(self.term.cols, self.term.rows, self.lamp.geometry());
                let (w, h) = self.view.world_size();
                self.lamp.resize(w, h, &self.settings.params);
            }

            for (key, mods) in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_key(key, mods) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            // edits made above land on this tick
            let params = self.settings.params;
            self.lamp.tick(&params);
            self.lamp.render(&params);
            self.render_frame()?;

            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame).as_secs_f32();
            last_frame = now;
            if dt > 0.0 {
                self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
            }

            wait_until(frame_start + frame_dt);
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        let params = &mut self.settings.params;
        match action {
            Action::Adjust(knob, dir) => {
                let value = knob.adjust(params, dir);
                if knob == Knob::ParticleDensity {
                    self.lamp.reseed_bubbles(params);
                }
                tracing::debug!(?knob, value, "knob moved");
            }
            Action::TogglePsychedelic => params.psychedelic = !params.psychedelic,
            Action::ToggleCycle => params.color_cycle = !params.color_cycle,
            Action::NextTheme => self.settings.theme = (self.settings.theme + 1) % THEMES.len(),
            Action::TogglePause => params.is_on = !params.is_on,
            Action::Reset => self.lamp.reset(params),
            Action::ToggleHud => self.settings.show_hud = !self.settings.show_hud,
            Action::Quit => self.should_quit = true,
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let theme = theme_for(self.settings.theme);
        self.term.cur.clear(theme.bg_global.to_color());
        compose(&self.lamp, &self.view, &theme, &mut self.term.cur);
        if self.settings.show_hud {
            draw_hud(
                &mut self.term.cur,
                &theme,
                &self.settings.params,
                &self.lamp.stats(),
                self.fps,
            );
        }
        self.term.present()
    }
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    let paths = if args.no_save {
        None
    } else {
        match project_paths() {
            Ok(p) => Some(p),
            Err(err) => {
                tracing::warn!(%err, "settings disabled");
                None
            }
        }
    };
    let mut settings = paths
        .as_ref()
        .map(|p| load_settings(&p.settings_path))
        .unwrap_or_default();
    settings.apply_args(&args);

    if let Some(frames) = args.headless {
        let summary = run_headless(&settings, frames);
        println!("{summary}");
        return Ok(());
    }

    let mut app = App::init(settings)?;
    let result = app.run();
    let restored = app.term.end();
    result?;
    restored?;

    save(paths.as_ref(), &app.settings)?;
    tracing::info!(frames = app.lamp.stats().frames, "lamp stopped");
    Ok(())
}

fn save(paths: Option<&Paths>, settings: &Settings) -> anyhow::Result<()> {
    let Some(paths) = paths else {
        return Ok(());
    };
    save_settings_atomic(&paths.settings_path, settings)
        .with_context(|| format!("saving settings to {}", paths.settings_path.display()))
}

/// Run the lamp without a terminal and describe where it ended up.
pub(crate) fn run_headless(settings: &Settings, frames: u64) -> String {
    let view = View::fit(HEADLESS_VIEW.0, HEADLESS_VIEW.1, &Geometry::default());
    let (w, h) = view.world_size();
    let params = settings.params;
    let mut lamp = Lamp::new(settings.seed, w, h, &params);

    let mut total = TickReport::default();
    for _ in 0..frames {
        let r = lamp.tick(&params);
        total.merges += r.merges;
        total.splits += r.splits;
        total.replenished += r.replenished;
    }
    lamp.render(&params);

    let stats = lamp.stats();
    tracing::info!(frames, merges = total.merges, splits = total.splits, "headless run finished");
    format!(
        "{}  mean_temp:{:.1}  merges:{}  splits:{}  replenished:{}  fluid_px:{}",
        status_line(&params, &stats, 0.0),
        stats.mean_temperature,
        total.merges,
        total.splits,
        total.replenished,
        lamp.frame().ink_count()
    )
}

/// Sleep in 1 ms slices until close to `deadline`, then spin the rest.
fn wait_until(deadline: Instant) {
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        if left.is_zero() {
            break;
        }
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_summary_is_reproducible() {
        let settings = Settings::default();
        let a = run_headless(&settings, 120);
        let b = run_headless(&settings, 120);
        assert_eq!(a, b);
        assert!(a.starts_with("Lava Lamp"));
        assert!(a.contains("merges:"));
        let fluid: usize = a
            .rsplit("fluid_px:")
            .next()
            .and_then(|n| n.trim().parse().ok())
            .unwrap();
        assert!(fluid > 0);
    }

    #[test]
    fn paused_headless_run_does_not_move_wax() {
        let mut settings = Settings::default();
        settings.params.is_on = false;
        let out = run_headless(&settings, 50);
        assert!(out.contains("[PAUSED]"));
        assert!(out.contains("merges:0  splits:0  replenished:0"));
    }

    #[test]
    fn late_frames_do_not_wait() {
        let t = Instant::now();
        wait_until(t);
        assert!(t.elapsed() < Duration::from_millis(10));

        let soon = Instant::now() + Duration::from_millis(5);
        wait_until(soon);
        assert!(Instant::now() >= soon);
    }
}
