use chrono::Duration;

use groundtrack::{
    frames::normalize_longitude,
    propagation::Resonance,
    tle::fix_checksum,
    to_epoch, advance, propagate, sample, Branch, GravityModel, OpsMode, OrbitalElementSet, Propagator, TrackConfig,
    TrackError, TrajectorySampler, DEFAULT_TLE,
};

const LINE1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
const LINE2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

fn approx(expected: f64, got: f64, eps: f64) {
    let diff = (expected - got).abs();
    assert!(diff <= eps, "expected {expected}, got {got} (|Δ| = {diff}, eps = {eps})");
}

#[test]
fn default_satellite_yields_a_day_of_track() {
    let els = OrbitalElementSet::from_text(DEFAULT_TLE).unwrap();
    assert_eq!(els.name.as_deref(), Some("ISS (ZARYA)"));

    let config = TrackConfig::default();
    let track = sample(&els, els.epoch, config.duration().unwrap(), config.step().unwrap()).unwrap();
    assert_eq!(track.len(), 480);

    for (lon, lat) in track.lon_lat() {
        assert!(lon > -180.0 && lon <= 180.0);
        assert!((-90.0..=90.0).contains(&lat));
        assert_eq!(normalize_longitude(lon), lon);
    }
}

#[test]
fn identical_inputs_give_bit_identical_states() {
    let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
    let at = advance(els.epoch, 12_345.0);

    let a = propagate(&els, at).unwrap();
    let b = Propagator::new(&els.clone()).unwrap().propagate(at).unwrap();
    for i in 0..3 {
        assert_eq!(a.position[i].to_bits(), b.position[i].to_bits());
        assert_eq!(a.velocity[i].to_bits(), b.velocity[i].to_bits());
    }
}

#[test]
fn calendar_epoch_matches_tle_epoch() {
    // 2000 day 179.78495062 = June 27, 18:50:19.733568
    let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
    let t = to_epoch(2000, 6, 27, 18, 50, 19).unwrap();
    approx(0.733_568, els.epoch.seconds_since(&t), 1.0e-4);

    assert!(matches!(to_epoch(2000, 2, 30, 0, 0, 0), Err(TrackError::InvalidCalendarDate { .. })));
}

#[test]
fn corrupted_checksum_is_malformed() {
    let bad = format!("{}5", &LINE1[..68]);
    assert!(matches!(OrbitalElementSet::from_lines(&bad, LINE2), Err(TrackError::MalformedElementSet(_))));
}

#[test]
fn afspc_mode_stays_close_to_improved_mode() {
    let els = OrbitalElementSet::from_lines(LINE1, LINE2).unwrap();
    let afspc = Propagator::with_model(&els, GravityModel::Wgs72, OpsMode::Afspc).unwrap();
    let improved = Propagator::with_model(&els, GravityModel::Wgs72, OpsMode::Improved).unwrap();

    // near-earth satellites only differ in the epoch sidereal time, which SGP4 does not
    // use outside the deep-space terms
    let a = afspc.propagate_minutes(720.0).unwrap();
    let b = improved.propagate_minutes(720.0).unwrap();
    approx(0.0, (a.position - b.position).norm(), 1.0e-9);
}

#[test]
fn molniya_track_over_two_days() {
    let l1 = fix_checksum("1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0  8130");
    let l2 = fix_checksum("2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225650");
    let els = OrbitalElementSet::from_lines(&l1, &l2).unwrap();

    let sampler = TrajectorySampler::new(&els, els.epoch, Duration::hours(48), Duration::minutes(10)).unwrap();
    assert_eq!(sampler.propagator().branch(), Branch::DeepSpace { resonance: Resonance::HalfDay });

    let track = sampler.evaluate().unwrap();
    assert_eq!(track.len(), 288);
    let max_lat = track.points.iter().map(|p| p.point.latitude.abs()).fold(0.0, f64::max);
    assert!(max_lat > 60.0 && max_lat < 65.0, "max latitude {max_lat}");
    for p in &track.points {
        assert!(p.point.altitude > 400.0 && p.point.altitude < 40_500.0, "alt {}", p.point.altitude);
    }
}

#[test]
fn decayed_satellite_aborts_the_track() {
    let l1 = fix_checksum("1 99002U 24001B   24001.00000000  .00000000  00000-0  00000-0 0  9990");
    let l2 = fix_checksum("2 99002  51.6000 100.0000 5000000  90.0000  10.0000 15.00000000    10");
    let els = OrbitalElementSet::from_lines(&l1, &l2).unwrap();

    let err = sample(&els, els.epoch, Duration::hours(1), Duration::minutes(1)).unwrap_err();
    assert!(matches!(err, TrackError::SampleFailed { index: 0, .. }));
    assert!(matches!(err.root(), TrackError::DecayedOrbit { .. }));
}
