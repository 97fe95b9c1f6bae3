//! The Monte Carlo engine (C5): seeding, the time-step loop, trial
//! proposal/evaluation/commit, and mitosis handling.

use std::f64::consts::PI;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cell::{Cell, Phase};
use crate::cell_type::CellTypeRegistry;
use crate::config::SimulationConfig;
use crate::drug::DrugSchedule;
use crate::error::{RunOutcome, SimResult};
use crate::point::Point;
use crate::recorder::Recorder;
use crate::spatial_index::{CellHandle, SpatialIndex};
use crate::variant::{self, ModelVariant, TrialKind};

/// The gap between the source's `sqrt(3 / 2)` bucket-size expression and the
/// value actually shipped (spec §9's open question: some languages evaluate
/// that expression as integer division, yielding `1.0`, then subtract this
/// epsilon). Preserved literally rather than "corrected" to `sqrt(1.5)`.
const BUCKET_SIZE_EPSILON: f64 = 0.001;

fn default_bucket_size() -> f64 {
    1.0 - BUCKET_SIZE_EPSILON
}

/// Owns the spatial index, the cell-type registry, the drug schedule, the
/// recorder, and a concrete model variant; runs the seeding and time-step
/// procedures of spec §4.3 over them.
pub struct Engine {
    index: SpatialIndex,
    registry: CellTypeRegistry,
    drugs: DrugSchedule,
    recorder: Recorder,
    variant: Box<dyn ModelVariant>,
    rng: StdRng,
    max_translation: f64,
    max_rotation: f64,
    max_deformation: f64,
    boundary: f64,
    time_increment: f64,
    num_steps: u64,
    initial_num: u32,
    density: f64,
    sync_cell_cycle: bool,
    max_radius: f64,
    time: f64,
}

impl Engine {
    /// Build an engine from a validated configuration (spec §6).
    pub fn new(config: &SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let registry = config.build_registry()?;
        let drugs = config.build_drug_schedule();
        let variant = variant::by_name(
            &config.variant,
            config.epsilon,
            config.delta,
            config.growth_rate,
            config.n_g,
        )?;
        let max_radius = registry.max_radius();

        Ok(Self {
            index: SpatialIndex::new(default_bucket_size()),
            registry,
            drugs,
            recorder: Recorder::new(config.output_interval),
            variant,
            rng: StdRng::seed_from_u64(config.seed),
            max_translation: config.max_translation,
            max_rotation: config.max_rotation,
            max_deformation: config.max_deformation,
            boundary: config.boundary,
            time_increment: config.time_increment,
            num_steps: config.num_steps,
            initial_num: config.initial_num,
            density: config.density,
            sync_cell_cycle: config.sync_cell_cycle,
            max_radius,
            time: 0.0,
        })
    }

    /// Run the configured number of time steps, polling `cancel` between
    /// seeding attempts and between completed time steps.
    ///
    /// Consumes the engine: a run is one-shot, and the returned
    /// [`RunOutcome`] carries away the snapshot buffer the recorder
    /// accumulated.
    pub fn run(mut self, cancel: &dyn Fn() -> bool) -> SimResult<RunOutcome> {
        if !self.seed(cancel)? {
            return Ok(RunOutcome::Cancelled(self.recorder.into_snapshots()));
        }

        self.recorder.record_initial(&self.index);

        let pb = Self::build_progress_bar(self.num_steps);

        for step in 1..=self.num_steps {
            if cancel() {
                pb.abandon();
                return Ok(RunOutcome::Cancelled(self.recorder.into_snapshots()));
            }
            self.one_time_step()?;
            self.time += self.time_increment;
            self.recorder.maybe_record(step, self.time, &self.index);
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(RunOutcome::Completed(self.recorder.into_snapshots()))
    }

    /// A progress bar over MC time steps, suppressed under `cfg(test)` so
    /// unit and property tests never draw to a terminal.
    fn build_progress_bar(num_steps: u64) -> ProgressBar {
        if cfg!(test) {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(num_steps);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} steps ({eta})")
                .unwrap()
                .progress_chars("##-"),
        );
        pb
    }

    /// Construct `initial_num` cells and place them without overlap inside
    /// the density-derived seeding disc (spec §4.3 "Seeding"). Returns
    /// `false` if cancelled before every cell was placed.
    ///
    /// TODO: the original constructor carries an unresolved "add burn in
    /// period without any growth steps" comment of its own; no such period
    /// is implemented here, since the source never settled on what it would
    /// do either.
    fn seed(&mut self, cancel: &dyn Fn() -> bool) -> SimResult<bool> {
        let mut pending = Vec::with_capacity(self.initial_num as usize);
        for _ in 0..self.initial_num {
            let cell_type = self.registry.random_type(&mut self.rng);
            let mut cell = Cell::new(cell_type, &mut self.rng)?;
            if !self.sync_cell_cycle {
                cell.goto_random_cycle_point(&mut self.rng);
            }
            pending.push(cell);
        }

        let total_area: f64 = pending
            .iter()
            .map(|c| PI * c.radius() * c.radius())
            .sum();
        let seeding_radius = (total_area / (PI * self.density)).sqrt();

        for mut cell in pending {
            loop {
                if cancel() {
                    return Ok(false);
                }
                let point = uniform_point_in_disc(seeding_radius, &mut self.rng);
                cell.set_coordinates(point);
                if !self.has_overlap(&cell, None) && self.within_radius(&cell, seeding_radius) {
                    break;
                }
            }
            self.index.insert(cell);
        }

        Ok(true)
    }

    /// One outer time step: drug application once, then exactly
    /// `index.size()` independent Monte Carlo steps (spec §4.3 "Time step").
    fn one_time_step(&mut self) -> SimResult<()> {
        self.drugs.update(self.time, &mut self.index);

        let n = self.index.size();
        for _ in 0..n {
            self.one_mc_step()?;
        }
        Ok(())
    }

    /// One proposal-evaluate-commit iteration (spec §4.3 "Monte Carlo step").
    fn one_mc_step(&mut self) -> SimResult<()> {
        if self.index.is_empty() {
            return Ok(());
        }

        let handle = self.index.random_handle(&mut self.rng);
        let orig = self.index.get(handle).clone();
        let (pre_energy, pre_neighbors) = self.energy_and_neighbors(handle, &orig);

        let mut trial = orig.clone();
        let kind = self.variant.attempt_trial(&trial, &mut self.rng);
        let is_growth = matches!(kind, TrialKind::Growth);
        self.apply_trial_geometry(&mut trial, kind);

        let accepted = if self.has_overlap(&trial, Some(handle)) || !self.check_boundary(&trial) {
            false
        } else {
            self.index.update(handle, orig.coordinates(), trial.coordinates())?;
            *self.index.get_mut(handle) = trial.clone();

            let (post_energy, post_neighbors) = self.energy_and_neighbors(handle, &trial);
            let accepted = if is_growth {
                true
            } else {
                self.variant.accept_trial(
                    pre_energy,
                    post_energy,
                    pre_neighbors,
                    post_neighbors,
                    &mut self.rng,
                )
            };

            if !accepted {
                self.index
                    .update(handle, trial.coordinates(), orig.coordinates())?;
                *self.index.get_mut(handle) = orig.clone();
            }
            accepted
        };

        if is_growth {
            self.index.get_mut(handle).add_to_trial_record(accepted);
        }

        if self.index.get(handle).ready_to_divide() {
            self.perform_mitosis(handle)?;
        }

        Ok(())
    }

    /// Apply the concrete geometry of one of the four trial kinds (spec
    /// §4.3 "Trial proposals").
    fn apply_trial_geometry(&mut self, cell: &mut Cell, kind: TrialKind) {
        let size = cell.cell_type().size();
        match kind {
            TrialKind::Growth => {
                let max_growth = self.variant.max_growth(cell).max(0.0);
                let delta = if max_growth > 0.0 {
                    self.rng.random_range(0.0..max_growth)
                } else {
                    0.0
                };
                let cap = (2.0 * size).sqrt();
                let new_radius = (cell.radius() + delta).min(cap);
                cell.set_radius(new_radius);
                if new_radius >= cap - 1e-12 {
                    cell.set_phase(Phase::Mitosis);
                }
            }
            TrialKind::Translation => {
                let u: f64 = self.rng.random_range(0.0..1.0);
                let angle_u: f64 = self.rng.random_range(0.0..1.0);
                let length = self.max_translation * u.sqrt();
                let theta = 2.0 * PI * angle_u;
                let p = cell.coordinates();
                cell.set_coordinates(Point::new(
                    p.x + length * theta.cos(),
                    p.y + length * theta.sin(),
                ));
            }
            TrialKind::Deformation => {
                let max_deformation = self
                    .variant
                    .max_deformation(cell)
                    .min(self.max_deformation)
                    .max(0.0);
                let delta = if max_deformation > 0.0 {
                    self.rng.random_range(0.0..max_deformation)
                } else {
                    0.0
                };
                let cap = (16.0 * size).sqrt();
                let new_len = (cell.axis_length() + delta).min(cap);
                cell.set_axis_length(new_len);
                if new_len >= cap - 1e-12 {
                    cell.set_ready_to_divide(true);
                }
            }
            TrialKind::Rotation => {
                let delta = if self.max_rotation > 0.0 {
                    self.rng.random_range(-self.max_rotation..self.max_rotation)
                } else {
                    0.0
                };
                let new_angle = (cell.axis_angle() + delta / size.sqrt()).rem_euclid(2.0 * PI);
                cell.set_axis_angle(new_angle);
            }
        }
    }

    /// Split a ready-to-divide cell into two interphase daughters (spec
    /// §4.3 step 7).
    fn perform_mitosis(&mut self, handle: CellHandle) -> SimResult<()> {
        let mut parent = self.index.get(handle).clone();
        let old_coords = parent.coordinates();
        let cell_type = Arc::clone(parent.cell_type());
        let mut daughter = Cell::new(cell_type, &mut self.rng)?;

        parent.divide(&mut daughter, &mut self.rng);

        self.index.update(handle, old_coords, parent.coordinates())?;
        *self.index.get_mut(handle) = parent;
        self.index.insert(daughter);
        Ok(())
    }

    /// The radius within which another cell could plausibly interact with
    /// one at its growth/translation limits (spec §4.3 "Overlap check").
    fn interaction_radius(&self) -> f64 {
        4.0 * self.max_radius + self.max_translation
    }

    fn energy_and_neighbors(&self, handle: CellHandle, cell: &Cell) -> (f64, u32) {
        let radius = self.interaction_radius();
        let neighbor_handles: Vec<CellHandle> = self
            .index
            .local_iterate(cell.coordinates(), radius)
            .filter(|&h| h != handle)
            .collect();
        let neighbors: Vec<&Cell> = neighbor_handles
            .iter()
            .map(|&h| self.index.get(h))
            .collect();
        let energy = self.variant.calculate_hamiltonian(cell, &neighbors);
        let num = self.variant.num_neighbors(cell, &neighbors);
        (energy, num)
    }

    /// True if `candidate` would overlap any other live cell (spec §4.3
    /// "Overlap check"); `exclude` is the candidate's own handle, if it is
    /// already resident in the index.
    fn has_overlap(&self, candidate: &Cell, exclude: Option<CellHandle>) -> bool {
        let radius = self.interaction_radius();
        self.index
            .local_iterate(candidate.coordinates(), radius)
            .filter(|&h| Some(h) != exclude)
            .any(|h| candidate.distance(self.index.get(h)) < 0.0)
    }

    /// True if `candidate` stays within the configured circular boundary
    /// (spec §4.3 "Boundary check"); always true when unbounded.
    fn check_boundary(&self, candidate: &Cell) -> bool {
        self.within_radius(candidate, self.boundary)
    }

    fn within_radius(&self, candidate: &Cell, radius: f64) -> bool {
        if radius <= 0.0 {
            return true;
        }
        let origin = Point::new(0.0, 0.0);
        let (a, b) = candidate.centers();
        a.distance(&origin) + candidate.radius() <= radius
            && b.distance(&origin) + candidate.radius() <= radius
    }
}

/// Sample a point uniformly from the disc of the given radius centered on
/// the origin.
fn uniform_point_in_disc(radius: f64, rng: &mut impl Rng) -> Point {
    let u: f64 = rng.random_range(0.0..1.0);
    let theta: f64 = rng.random_range(0.0..2.0 * PI);
    let r = radius * u.sqrt();
    Point::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CellTypeConfig, CycleLengthSamplerConfig, SimulationConfig};
    use crate::error::SimError;

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            initial_num: 1,
            density: 0.1,
            max_translation: 0.1,
            max_rotation: 0.1,
            max_deformation: 0.1,
            epsilon: 1.0,
            delta: 1.0,
            output_interval: 1,
            seed: 42,
            growth_rate: 0.0,
            inherit_growth: false,
            n_g: 24.0,
            time_increment: 1.0,
            num_steps: 10,
            boundary: 0.0,
            sync_cell_cycle: true,
            cell_types: vec![CellTypeConfig {
                id: 0,
                name: "tumor".into(),
                size: 1.0,
                min_cycle: 24.0,
                cycle_length: CycleLengthSamplerConfig::Uniform {
                    min: 24.0,
                    max: 30.0,
                },
            }],
            drugs: vec![],
            variant: "drasdoHohme".into(),
        }
    }

    /// S1: a single cell, no growth budget, over 10 steps: it must still be
    /// present afterwards, having moved only within the translation budget.
    #[test]
    fn s1_single_cell_survives_and_stays_bounded() {
        let config = base_config();
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| false).unwrap();
        assert!(!outcome.was_cancelled());
        let last = outcome.snapshots().last().unwrap();
        assert_eq!(last.cells.len(), 1);
        let displacement = (last.cells[0].x.powi(2) + last.cells[0].y.powi(2)).sqrt();
        assert!(displacement <= config.max_translation * config.num_steps as f64 + 1e-6);
    }

    /// The configured `maxDeformation` must bound the deformation draw even
    /// when the variant's own per-cell cap (derived from `growthRate`/`nG`)
    /// would otherwise allow a larger step.
    #[test]
    fn deformation_draw_is_bounded_by_configured_max_deformation() {
        let mut config = base_config();
        config.max_deformation = 0.01;
        config.growth_rate = 100.0;
        let mut engine = Engine::new(&config).unwrap();

        let ty = engine.registry.get(0).unwrap().clone();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let mut cell = Cell::new(ty, &mut rng).unwrap();
        cell.set_phase(Phase::Mitosis);
        let axis_length_before = cell.axis_length();

        for _ in 0..50 {
            let before = cell.axis_length();
            engine.apply_trial_geometry(&mut cell, TrialKind::Deformation);
            let grew_by = cell.axis_length() - before;
            assert!(grew_by <= config.max_deformation + 1e-9);
        }
        assert!(cell.axis_length() >= axis_length_before);
    }

    #[test]
    fn unknown_variant_is_a_configuration_error() {
        let mut config = base_config();
        config.variant = "not-a-real-variant".into();
        let err = Engine::new(&config).unwrap_err();
        assert!(matches!(err, SimError::Configuration { field: "variant", .. }));
    }

    #[test]
    fn cancellation_before_any_step_yields_empty_snapshots() {
        let config = base_config();
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| true).unwrap();
        assert!(outcome.was_cancelled());
        assert!(outcome.snapshots().is_empty());
    }

    /// S2-style check: a denser population still satisfies the no-overlap
    /// invariant in every recorded snapshot.
    #[test]
    fn no_overlap_across_a_larger_seeded_population() {
        let mut config = base_config();
        config.initial_num = 20;
        config.density = 0.3;
        config.num_steps = 5;
        config.seed = 7;
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| false).unwrap();
        for snapshot in outcome.snapshots() {
            for i in 0..snapshot.cells.len() {
                for j in (i + 1)..snapshot.cells.len() {
                    let a = &snapshot.cells[i];
                    let b = &snapshot.cells[j];
                    let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                    assert!(d - a.radius - b.radius >= -1e-6);
                }
            }
        }
    }
}
