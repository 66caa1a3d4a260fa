use crate::bloom::Glow;
use crate::bounds::{Bounds, Geometry};
use crate::canvas::PixelCanvas;
use crate::color::Palette;
use crate::config::Params;
use crate::field::FieldRenderer;
use crate::lighting::Atmosphere;
use crate::particles::{Bubbles, Sparkles};
use crate::population::{Population, TickReport};
use rand::{rngs::StdRng, SeedableRng};

const TIME_STEP: f64 = 0.01;
const PHASE_STEP: f64 = 0.005;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Stats {
    pub(crate) blobs: usize,
    pub(crate) sparkles: usize,
    pub(crate) bubbles: usize,
    pub(crate) mean_temperature: f64,
    pub(crate) frames: u64,
}

/// The whole lamp: glass, wax, particles and the rasters drawn from them.
/// All randomness comes from one seeded generator.
pub(crate) struct Lamp {
    rng: StdRng,
    geometry: Geometry,
    bounds: Bounds,
    population: Population,
    sparkles: Sparkles,
    bubbles: Bubbles,
    field: FieldRenderer,
    frame: PixelCanvas,
    glow: Option<Glow>,
    atmosphere: Option<Atmosphere>,
    phase: f64,
    time: f64,
    frames: u64,
}

impl Lamp {
    pub(crate) fn new(seed: u64, w: u32, h: u32, params: &Params) -> Self {
        Self::with_geometry(seed, Geometry::default(), w, h, params)
    }

    pub(crate) fn with_geometry(seed: u64, geometry: Geometry, w: u32, h: u32, params: &Params) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let bounds = Bounds::for_canvas(&geometry, w as f64, h as f64);
        let population = Population::seeded(params, &bounds, &mut rng);
        let bubbles = Bubbles::seeded(params, &bounds, &mut rng);
        Self {
            rng,
            geometry,
            bounds,
            population,
            sparkles: Sparkles::default(),
            bubbles,
            field: FieldRenderer::new(w, h),
            frame: PixelCanvas::new(w, h),
            glow: None,
            atmosphere: None,
            phase: 0.0,
            time: 0.0,
            frames: 0,
        }
    }

    /// One frame of simulation. Blob physics stops while the lamp is off;
    /// particles and the colour clock keep going.
    pub(crate) fn tick(&mut self, params: &Params) -> TickReport {
        let report = self.population.tick(params, &self.bounds, &mut self.rng);
        if report.merges > 0 || report.splits > 0 {
            tracing::debug!(
                merges = report.merges,
                splits = report.splits,
                blobs = self.population.len(),
                "population changed"
            );
        }

        self.sparkles.update(self.population.blobs(), self.phase, &mut self.rng);
        self.bubbles.update(
            params,
            &self.bounds,
            self.population.blobs(),
            &mut self.rng,
        );

        self.time += TIME_STEP;
        if params.color_cycle {
            self.phase = (self.phase + PHASE_STEP) % 1.0;
        }
        self.frames += 1;
        report
    }

    pub(crate) fn palette(&self, params: &Params) -> Palette {
        Palette {
            phase: self.phase,
            time: self.time,
            psychedelic: params.psychedelic_colors(),
        }
    }

    /// Rasterise the current state into [`Lamp::frame`] and [`Lamp::glow`].
    pub(crate) fn render(&mut self, params: &Params) {
        let palette = self.palette(params);
        let fluid = self
            .field
            .render(self.population.blobs(), &self.bounds, params, &palette);
        self.frame.px.copy_from_slice(&fluid.px);

        self.glow = Glow::build(fluid, &self.sparkles, params.bloom_intensity);
        self.atmosphere = Atmosphere::new(params, &self.bounds, &self.geometry, self.phase, self.time);

        if params.psychedelic {
            self.sparkles.draw(&mut self.frame);
        }
        self.bubbles.draw(&mut self.frame);
    }

    pub(crate) fn reset(&mut self, params: &Params) {
        self.population.reseed(params, &self.bounds, &mut self.rng);
        self.sparkles.clear();
        self.phase = 0.0;
        tracing::debug!(blobs = self.population.len(), "lamp reset");
    }

    pub(crate) fn resize(&mut self, w: u32, h: u32, params: &Params) {
        self.bounds = Bounds::for_canvas(&self.geometry, w as f64, h as f64);
        self.field.resize(w, h);
        self.frame = PixelCanvas::new(w, h);
        self.glow = None;
        self.atmosphere = None;
        self.population.reseed(params, &self.bounds, &mut self.rng);
        self.sparkles.clear();
        self.bubbles.reseed(params, &self.bounds, &mut self.rng);
        tracing::debug!(w, h, blobs = self.population.len(), "lamp resized");
    }

    pub(crate) fn reseed_bubbles(&mut self, params: &Params) {
        self.bubbles.reseed(params, &self.bounds, &mut self.rng);
    }

    pub(crate) fn stats(&self) -> Stats {
        Stats {
            blobs: self.population.len(),
            sparkles: self.sparkles.len(),
            bubbles: self.bubbles.len(),
            mean_temperature: self.population.mean_temperature(),
            frames: self.frames,
        }
    }

    pub(crate) fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub(crate) fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub(crate) fn frame(&self) -> &PixelCanvas {
        &self.frame
    }

    pub(crate) fn glow(&self) -> Option<&Glow> {
        self.glow.as_ref()
    }

    pub(crate) fn atmosphere(&self) -> Option<&Atmosphere> {
        self.atmosphere.as_ref()
    }
}
