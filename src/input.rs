use crate::config::{Params, KNOB_RANGE};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

const HEAT_STEP: f64 = 5.0;
const KNOB_STEP: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Knob {
    Heat,
    Viscosity,
    Smoothness,
    Speed,
    ParticleDensity,
    VisualQuality,
    Bloom,
}

impl Knob {
    fn slot(self, params: &mut Params) -> &mut f64 {
        match self {
            Knob::Heat => &mut params.heat,
            Knob::Viscosity => &mut params.viscosity,
            Knob::Smoothness => &mut params.smoothness,
            Knob::Speed => &mut params.speed,
            Knob::ParticleDensity => &mut params.particle_density,
            Knob::VisualQuality => &mut params.visual_quality,
            Knob::Bloom => &mut params.bloom_intensity,
        }
    }

    /// Nudge the knob one step and return its new value, kept in range.
    pub(crate) fn adjust(self, params: &mut Params, dir: f64) -> f64 {
        if self == Knob::Heat {
            params.set_heat(params.heat + dir * HEAT_STEP);
            return params.heat;
        }
        let slot = self.slot(params);
        *slot = (*slot + dir * KNOB_STEP).clamp(KNOB_RANGE.0, KNOB_RANGE.1);
        *slot
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Adjust(Knob, f64),
    TogglePsychedelic,
    ToggleCycle,
    NextTheme,
    TogglePause,
    Reset,
    ToggleHud,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<(KeyCode, KeyModifiers)>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push((k.code, k.modifiers));
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_key(key: KeyCode, mods: KeyModifiers) -> Option<Action> {
    if mods.contains(KeyModifiers::CONTROL) && matches!(key, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Up => Some(Action::Adjust(Knob::Heat, 1.0)),
        KeyCode::Down => Some(Action::Adjust(Knob::Heat, -1.0)),
        KeyCode::Right => Some(Action::Adjust(Knob::Viscosity, 1.0)),
        KeyCode::Left => Some(Action::Adjust(Knob::Viscosity, -1.0)),
        KeyCode::Char(ch) => match ch.to_ascii_lowercase() {
            ']' => Some(Action::Adjust(Knob::Smoothness, 1.0)),
            '[' => Some(Action::Adjust(Knob::Smoothness, -1.0)),
            '=' | '+' => Some(Action::Adjust(Knob::Speed, 1.0)),
            '-' | '_' => Some(Action::Adjust(Knob::Speed, -1.0)),
            '.' => Some(Action::Adjust(Knob::ParticleDensity, 1.0)),
            ',' => Some(Action::Adjust(Knob::ParticleDensity, -1.0)),
            '\'' => Some(Action::Adjust(Knob::VisualQuality, 1.0)),
            ';' => Some(Action::Adjust(Knob::VisualQuality, -1.0)),
            '0' => Some(Action::Adjust(Knob::Bloom, 1.0)),
            '9' => Some(Action::Adjust(Knob::Bloom, -1.0)),
            'p' => Some(Action::TogglePsychedelic),
            'c' => Some(Action::ToggleCycle),
            't' => Some(Action::NextTheme),
            ' ' => Some(Action::TogglePause),
            'r' => Some(Action::Reset),
            'h' => Some(Action::ToggleHud),
            'q' => Some(Action::Quit),
            _ => None,
        },
        KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> Option<Action> {
        map_key(KeyCode::Char(ch), KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(map_key(KeyCode::Up, KeyModifiers::NONE), Some(Action::Adjust(Knob::Heat, 1.0)));
        assert_eq!(map_key(KeyCode::Left, KeyModifiers::NONE), Some(Action::Adjust(Knob::Viscosity, -1.0)));
        assert_eq!(key('['), Some(Action::Adjust(Knob::Smoothness, -1.0)));
        assert_eq!(key('.'), Some(Action::Adjust(Knob::ParticleDensity, 1.0)));
        assert_eq!(key('0'), Some(Action::Adjust(Knob::Bloom, 1.0)));
        assert_eq!(key('P'), Some(Action::TogglePsychedelic));
        assert_eq!(key(' '), Some(Action::TogglePause));
        assert_eq!(key('x'), None);
        assert_eq!(map_key(KeyCode::Esc, KeyModifiers::NONE), Some(Action::Quit));
        assert_eq!(map_key(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Action::Quit));
        assert_eq!(key('c'), Some(Action::ToggleCycle));
    }

    #[test]
    fn heat_knob_switches_the_lamp() {
        let mut p = Params { heat: 15.0, ..Params::default() };
        assert_eq!(Knob::Heat.adjust(&mut p, -1.0), 10.0);
        assert!(!p.is_on);
        assert_eq!(Knob::Heat.adjust(&mut p, 1.0), 15.0);
        assert!(p.is_on);
        for _ in 0..30 {
            Knob::Heat.adjust(&mut p, 1.0);
        }
        assert_eq!(p.heat, 100.0);
    }

    #[test]
    fn knobs_stay_in_range() {
        let mut p = Params::default();
        for _ in 0..20 {
            Knob::Smoothness.adjust(&mut p, 1.0);
            Knob::Bloom.adjust(&mut p, -1.0);
        }
        assert_eq!(p.smoothness, 10.0);
        assert_eq!(p.bloom_intensity, 1.0);
        assert_eq!(Knob::Speed.adjust(&mut p, 1.0), 6.0);
    }
}
