//! Property tests for the invariants of spec §8 that must hold at every
//! observable state: no pairwise overlap, boundary containment, and
//! radius/axis bounds.

use off_lattice_cell_mc::{CellTypeConfig, CycleLengthSamplerConfig, Engine, SimulationConfig};
use proptest::prelude::*;

fn config_for(seed: u64, initial_num: u32, density: f64, num_steps: u64, boundary: f64) -> SimulationConfig {
    SimulationConfig {
        initial_num,
        density,
        max_translation: 0.2,
        max_rotation: 0.2,
        max_deformation: 0.2,
        epsilon: 1.0,
        delta: 1.0,
        output_interval: 1,
        seed,
        growth_rate: 0.5,
        inherit_growth: false,
        n_g: 24.0,
        time_increment: 1.0,
        num_steps,
        boundary,
        sync_cell_cycle: false,
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

proptest! {
    // Invariant 1: no two cells overlap, in every recorded snapshot.
    #[test]
    fn no_overlap_across_runs(
        seed in 0u64..1000,
        initial_num in 2u32..15,
        density in 0.1f64..0.6,
        num_steps in 1u64..8,
    ) {
        let config = config_for(seed, initial_num, density, num_steps, 0.0);
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| false).unwrap();

        for snapshot in outcome.snapshots() {
            for i in 0..snapshot.cells.len() {
                for j in (i + 1)..snapshot.cells.len() {
                    let a = &snapshot.cells[i];
                    let b = &snapshot.cells[j];
                    let center_distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                    prop_assert!(center_distance - a.radius - b.radius >= -1e-6);
                }
            }
        }
    }

    // Invariant 3: radius and axis length stay within their type-derived bounds.
    #[test]
    fn radius_and_axis_stay_in_bounds(
        seed in 0u64..1000,
        initial_num in 1u32..10,
        density in 0.1f64..0.6,
        num_steps in 1u64..8,
    ) {
        let config = config_for(seed, initial_num, density, num_steps, 0.0);
        let size = config.cell_types[0].size;
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| false).unwrap();

        let min_radius = size.sqrt();
        let max_radius = (2.0 * size).sqrt();
        let max_axis = (16.0 * size).sqrt();

        for snapshot in outcome.snapshots() {
            for cell in &snapshot.cells {
                prop_assert!(cell.radius >= min_radius - 1e-9);
                prop_assert!(cell.radius <= max_radius + 1e-9);
                prop_assert!(cell.axis_length >= 2.0 * cell.radius - 1e-9);
                prop_assert!(cell.axis_length <= max_axis + 1e-9);
            }
        }
    }

    // Invariant 2: with a boundary set, every lobe center plus radius stays inside it.
    #[test]
    fn bounded_population_stays_inside_boundary(
        seed in 0u64..1000,
        initial_num in 2u32..10,
        num_steps in 1u64..8,
    ) {
        let boundary = 10.0;
        let config = config_for(seed, initial_num, 0.3, num_steps, boundary);
        let engine = Engine::new(&config).unwrap();
        let outcome = engine.run(&|| false).unwrap();

        for snapshot in outcome.snapshots() {
            for cell in &snapshot.cells {
                let distance_from_origin = (cell.x * cell.x + cell.y * cell.y).sqrt();
                prop_assert!(distance_from_origin + cell.radius <= boundary + 1e-6);
            }
        }
    }
}
