use projectile_engine::{
    bin, read_trials, run_batch, theoretical_distance, write_trials, DrivenConfig, DrivenIntegrator,
    ExportColumns, FlightOutcome, ForceModel, HeadlessIntegrator, IntegratorConfig, LaunchParams,
    ParamRanges, PointMassHost, TrialField, TrialOrigin, TrialStore, UniformSampler,
};

fn vacuum(launch_velocity: f64, angle_deg: f64) -> LaunchParams {
    LaunchParams {
        launch_velocity,
        angle_deg,
        drag: 0.0,
        air_density: 0.0,
        spin: 0.0,
        ..Default::default()
    }
}

#[test]
fn test_drag_free_range_within_one_percent() {
    let integrator = HeadlessIntegrator::new(IntegratorConfig::ground_level(), ForceModel::default());

    // long enough flights that one 1/60 s tick stays under 1% of air time
    for &velocity in &[25.0, 35.0, 50.0] {
        for &angle in &[30.0, 45.0, 60.0] {
            let params = vacuum(velocity, angle);
            let result = integrator.run(&params);
            let expected = theoretical_distance(&params);
            assert_eq!(result.outcome, FlightOutcome::Landed);
            assert!(
                (result.distance - expected).abs() / expected < 0.01,
                "v={velocity} angle={angle}: {} vs {expected}",
                result.distance
            );
        }
    }
}

#[test]
fn test_trajectory_invariants_over_batch() {
    let mut store = TrialStore::new();
    let mut sampler = UniformSampler::new(ParamRanges::default(), LaunchParams::default(), 2024).unwrap();
    run_batch(60, &mut sampler, &mut store, HeadlessIntegrator::default()).run_to_end(|_| {});

    for trial in &store {
        let trajectory = &trial.results.trajectory;
        assert!(trajectory.points().iter().all(|p| p.y <= trial.results.max_height));
        if let Some(last) = trajectory.final_point() {
            assert_eq!(last.x, trial.results.distance);
        }
        let bound = (trial.results.air_time / IntegratorConfig::default().sample_interval).floor() as usize + 1;
        assert!(trajectory.len() <= bound);
    }
}

#[test]
fn test_driven_matches_headless_over_parameter_spread() {
    let config = IntegratorConfig::default();
    let headless = HeadlessIntegrator::new(config, ForceModel::default());

    for (velocity, angle, spin) in [(10.0, 30.0, 0.0), (25.0, 55.0, 30.0), (40.0, 15.0, -20.0)] {
        let params = LaunchParams { launch_velocity: velocity, angle_deg: angle, spin, ..Default::default() };
        let expected = headless.run(&params);

        let mut host = PointMassHost::for_params(&params);
        let mut driven = DrivenIntegrator::new(DrivenConfig::default(), ForceModel::default());
        driven.launch(&mut host, params);
        let result = loop {
            if let Some(result) = driven.step(&mut host) {
                break result;
            }
        };

        assert_eq!(result.outcome, FlightOutcome::Landed);
        assert!((result.distance - expected.distance).abs() < 1e-6);
        assert!((result.air_time - expected.air_time).abs() < 1e-9);
    }
}

#[test]
fn test_batch_export_import_heatmap_pipeline() {
    let mut store = TrialStore::new();
    let mut sampler = UniformSampler::new(ParamRanges::default(), LaunchParams::default(), 77).unwrap();
    run_batch(30, &mut sampler, &mut store, HeadlessIntegrator::default()).run_to_end(|_| {});

    let mut buffer = Vec::new();
    write_trials(&mut buffer, store.trials(), ExportColumns::Full).unwrap();
    let mut imported = TrialStore::new();
    let report = read_trials(buffer.as_slice(), &mut imported).unwrap();
    assert_eq!(report.imported.len(), 30);
    assert!(imported.iter().all(|t| t.origin == TrialOrigin::Imported));

    let original = bin(store.trials(), TrialField::Angle, TrialField::LaunchVelocity, TrialField::Distance, 6, 6);
    let reloaded = bin(imported.trials(), TrialField::Angle, TrialField::LaunchVelocity, TrialField::Distance, 6, 6);
    for (a, b) in original.cells().iter().zip(reloaded.cells()) {
        assert_eq!(a.count, b.count);
        match (a.value, b.value) {
            (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9),
            (None, None) => {},
            other => panic!("cells differ: {other:?}"),
        }
    }
}
