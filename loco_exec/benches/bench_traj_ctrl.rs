//! # Trajectory Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use loco_lib::{
    kin::{KinLimits, Velocity},
    loc::Pose,
    traj_ctrl::{Params, TrajCtrl, Trajectory, TrajectoryPoint},
};

fn traj_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a long zig-zag route ----

    let num_points = 200;
    let points: Vec<TrajectoryPoint> = (1..=num_points)
        .map(|i| {
            let x_mm = 100.0 * i as f64;
            let y_mm = if i % 2 == 0 { 0.0 } else { 80.0 };
            let speed_mms = if i == num_points { 0.0 } else { 200.0 };
            TrajectoryPoint::new(x_mm, y_mm, 0.0, speed_mms)
        })
        .collect();

    let trajectory = Trajectory::new(points);
    let start = Pose::new(0.0, -20.0, 0.1);
    let current = Velocity::new(150.0, 0.0, 0.0);

    let mut traj_ctrl = TrajCtrl::new(KinLimits::default(), Params::default());

    // One control step, starting from a fresh copy of the route each time so that no points are
    // consumed between iterations
    c.bench_function("TrajCtrl::proc", |b| {
        b.iter(|| {
            traj_ctrl.new_trajectory(trajectory.clone(), &start);
            traj_ctrl.proc(black_box(&start), black_box(&current), black_box(0.05))
        })
    });
}

criterion_group!(benches, traj_ctrl_benchmark);
criterion_main!(benches);
