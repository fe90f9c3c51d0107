//! # Trajectory Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::eqpt::{AircraftState, GeoPosition, Velocity};
use gnd_lib::traj_ctrl::{calc_error, Params, TrajCtrl, Trajectory, Waypoint};
use util::module::State;

fn traj_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a trajectory and an aircraft state away from it ----

    let trajectory = Trajectory::default();

    let state = AircraftState {
        position: GeoPosition {
            latitude: 51.18915,
            longitude: -4.41200,
            altitude: 37.5,
        },
        heading: 42.0,
        velocity: Velocity { x: 1.0, y: 0.5, z: 0.0 },
    };

    let waypoint = Waypoint::new(51.1893, -4.41103, 50.0, 0.0, 0.0);

    // ---- Benchmarks ----

    c.bench_function("calc_error", |b| {
        b.iter(|| calc_error(black_box(&waypoint), black_box(&state)))
    });

    let mut traj_ctrl = TrajCtrl::default();
    if let Err(e) = traj_ctrl.init((Params::default(), trajectory)) {
        panic!("Could not initialise TrajCtrl: {}", e);
    }

    c.bench_function("traj_ctrl_proc", |b| {
        b.iter(|| traj_ctrl.proc(black_box(&state)))
    });
}

criterion_group!(benches, traj_ctrl_benchmark);
criterion_main!(benches);
