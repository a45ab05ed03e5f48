use super::*;

fn res(w: f64, h: f64) -> Vec2 {
    Vec2::new(w, h)
}

fn gabor(params: &StimulusParameters, t: f64) -> FieldProgram {
    FieldProgram::calibrate(
        RenderMode::GaborPatch,
        params,
        60.0,
        0.5,
        res(64.0, 48.0),
        t,
    )
}

fn grid(w: u32, h: u32) -> impl Iterator<Item = Point> {
    (0..h).flat_map(move |r| (0..w).map(move |c| Point::new(f64::from(c) + 0.5, f64::from(r) + 0.5)))
}

#[test]
fn solid_field_is_gamma_corrected_mid_gray() {
    let params = StimulusParameters {
        display_gamma: 2.2,
        ..StimulusParameters::default()
    };
    let p = FieldProgram::calibrate(RenderMode::SolidField, &params, 60.0, 0.5, res(8.0, 8.0), 0.0);
    let expected = 0.5f64.powf(1.0 / 2.2);
    assert!((expected - 0.7297).abs() < 1e-4);
    for frag in grid(8, 8) {
        for aa in [AntiAliasMode::DirectSample, AntiAliasMode::AnalyticFootprint] {
            assert_eq!(p.luminance(frag, aa), MID_GRAY);
            assert_eq!(p.display_value(frag, aa), expected);
        }
    }
    let later =
        FieldProgram::calibrate(RenderMode::SolidField, &params, 60.0, 0.5, res(8.0, 8.0), 99.0);
    assert_eq!(later.display_value(Point::new(3.5, 3.5), AntiAliasMode::DirectSample), expected);
}

#[test]
fn zero_contrast_gabor_is_exactly_mid_gray() {
    let params = StimulusParameters {
        contrast: 0.0,
        spatial_frequency: 17.0,
        temporal_frequency: 5.0,
        orientation: 33.0,
        ..StimulusParameters::default()
    };
    for t in [0.0, 0.37, 12.5] {
        let p = gabor(&params, t);
        for frag in grid(64, 48) {
            assert_eq!(p.luminance(frag, AntiAliasMode::DirectSample), 0.5);
            assert_eq!(p.luminance(frag, AntiAliasMode::AnalyticFootprint), 0.5);
        }
    }
}

#[test]
fn static_grating_has_no_time_dependence() {
    let params = StimulusParameters {
        temporal_frequency: 0.0,
        initial_phase: 0.3,
        orientation: 20.0,
        ..StimulusParameters::default()
    };
    let a = gabor(&params, 0.5);
    let b = gabor(&params, 7.25);
    assert_eq!(a, b);
    for frag in grid(64, 48) {
        assert_eq!(
            a.luminance(frag, AntiAliasMode::DirectSample),
            b.luminance(frag, AntiAliasMode::DirectSample)
        );
    }
}

#[test]
fn luminance_stays_in_unit_interval_for_extremes() {
    for contrast in [0.0, 0.5, 1.0] {
        for sigma in [1e-6, 0.05, 1.0, 1e6] {
            for sf in [0.01, 3.0, 60.0, 500.0] {
                let params = StimulusParameters {
                    contrast,
                    envelope_sigma: sigma,
                    spatial_frequency: sf,
                    orientation: 45.0,
                    temporal_frequency: 2.0,
                    ..StimulusParameters::default()
                };
                let p = gabor(&params, 0.123);
                for frag in grid(64, 48) {
                    for aa in [AntiAliasMode::DirectSample, AntiAliasMode::AnalyticFootprint] {
                        let l = p.luminance(frag, aa);
                        assert!((0.0..=1.0).contains(&l), "l={l}");
                    }
                }
            }
        }
    }
}

#[test]
fn non_finite_inputs_stay_in_unit_interval() {
    let base = StimulusParameters {
        contrast: 1.0,
        orientation: 30.0,
        ..StimulusParameters::default()
    };
    let unusable_calibration = FieldProgram::calibrate(
        RenderMode::GaborPatch,
        &base,
        0.0,
        0.5,
        res(64.0, 48.0),
        0.25,
    );
    let mut programs = vec![unusable_calibration];
    for params in [
        StimulusParameters {
            contrast: f64::NAN,
            ..base
        },
        StimulusParameters {
            contrast: f64::INFINITY,
            ..base
        },
        StimulusParameters {
            temporal_frequency: f64::NAN,
            ..base
        },
        StimulusParameters {
            initial_phase: f64::INFINITY,
            ..base
        },
        StimulusParameters {
            envelope_sigma: f64::NAN,
            ..base
        },
    ] {
        programs.push(gabor(&params, 0.25));
    }

    for p in &programs {
        for frag in grid(64, 48) {
            for aa in [AntiAliasMode::DirectSample, AntiAliasMode::AnalyticFootprint] {
                let l = p.luminance(frag, aa);
                assert!((0.0..=1.0).contains(&l), "l={l}");
            }
        }
    }

    // An undefined carrier reads as mid-gray rather than saturating.
    let frag = Point::new(10.5, 10.5);
    assert_eq!(programs[0].luminance(frag, AntiAliasMode::DirectSample), MID_GRAY);
    assert_eq!(programs[1].luminance(frag, AntiAliasMode::DirectSample), MID_GRAY);
}

#[test]
fn out_of_range_contrast_saturates() {
    let params = StimulusParameters {
        contrast: 5.0,
        spatial_frequency: 0.0,
        ..StimulusParameters::default()
    };
    // Zero spatial frequency and zero phase: carrier is 1 everywhere, so the center saturates.
    let p = gabor(&params, 0.0);
    assert_eq!(p.luminance(Point::new(32.0, 24.0), AntiAliasMode::DirectSample), 1.0);

    let params = StimulusParameters {
        initial_phase: std::f64::consts::PI,
        ..params
    };
    let p = gabor(&params, 0.0);
    assert_eq!(p.luminance(Point::new(32.0, 24.0), AntiAliasMode::DirectSample), 0.0);
}

#[test]
fn center_pixel_follows_carrier_phase() {
    let params = StimulusParameters {
        contrast: 1.0,
        initial_phase: 0.0,
        ..StimulusParameters::default()
    };
    let p = gabor(&params, 0.0);
    // Center of a 64x48 target; envelope = 1, carrier = cos(0) = 1.
    let l = p.luminance(Point::new(32.0, 24.0), AntiAliasMode::DirectSample);
    assert!((l - 1.0).abs() < 1e-12);
}

#[test]
fn drift_advances_phase_linearly() {
    assert_eq!(drift_phase(0.5, 0.0, 10.0), 0.5);
    assert!((drift_phase(0.0, 2.0, 0.25) - std::f64::consts::PI).abs() < 1e-12);
    assert!((drift_phase(0.0, -2.0, 0.25) + std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn full_cycle_of_drift_repeats_the_frame() {
    let params = StimulusParameters {
        temporal_frequency: 4.0,
        contrast: 1.0,
        ..StimulusParameters::default()
    };
    let a = gabor(&params, 0.0);
    let b = gabor(&params, 0.25);
    for frag in grid(64, 48) {
        let la = a.luminance(frag, AntiAliasMode::DirectSample);
        let lb = b.luminance(frag, AntiAliasMode::DirectSample);
        assert!((la - lb).abs() < 1e-9);
    }
}

#[test]
fn rotation_by_ninety_degrees_swaps_axes() {
    let base = StimulusParameters {
        contrast: 1.0,
        ..StimulusParameters::default()
    };
    let vertical = gabor(&base, 0.0);
    let horizontal = gabor(
        &StimulusParameters {
            orientation: 90.0,
            ..base
        },
        0.0,
    );
    let Point { x: x0, .. } = match vertical {
        FieldProgram::Gabor(u) => u.grating_coords(Point::new(42.0, 24.0)),
        _ => unreachable!(),
    };
    let Point { y: y90, .. } = match horizontal {
        FieldProgram::Gabor(u) => u.grating_coords(Point::new(42.0, 24.0)),
        _ => unreachable!(),
    };
    assert!((x0 - 10.0).abs() < 1e-12);
    assert!((y90 - 10.0).abs() < 1e-12);
}

#[test]
fn orientation_is_periodic_mod_360() {
    let a = gabor(
        &StimulusParameters {
            orientation: 30.0,
            contrast: 1.0,
            ..StimulusParameters::default()
        },
        0.0,
    );
    let b = gabor(
        &StimulusParameters {
            orientation: 390.0,
            contrast: 1.0,
            ..StimulusParameters::default()
        },
        0.0,
    );
    for frag in grid(64, 48) {
        let la = a.luminance(frag, AntiAliasMode::DirectSample);
        let lb = b.luminance(frag, AntiAliasMode::DirectSample);
        assert!((la - lb).abs() < 1e-9);
    }
}

#[test]
fn envelope_decays_away_from_center() {
    let params = StimulusParameters {
        contrast: 1.0,
        spatial_frequency: 0.0,
        envelope_sigma: 0.1,
        ..StimulusParameters::default()
    };
    let p = gabor(&params, 0.0);
    let center = p.luminance(Point::new(32.0, 24.0), AntiAliasMode::DirectSample);
    let one_sigma = p.luminance(Point::new(38.0, 24.0), AntiAliasMode::DirectSample);
    let far = p.luminance(Point::new(63.5, 47.5), AntiAliasMode::DirectSample);
    assert!((center - 1.0).abs() < 1e-12);
    // 0.1 deg * 60 px/deg = 6 px sigma.
    assert!((one_sigma - (0.5 + 0.5 * (-0.5f64).exp())).abs() < 1e-12);
    assert!((far - 0.5).abs() < 1e-6);
}

#[test]
fn attenuation_limits() {
    assert_eq!(footprint_attenuation(0.0, 1.0), 1.0);
    assert_eq!(footprint_attenuation(1e-7, 1.0), 1.0);
    let near_zero = footprint_attenuation(1e-3, 1.0);
    assert!((near_zero - 1.0).abs() < 1e-6);
    // s = π at k = 2π, w = 1.
    let at_pi = footprint_attenuation(TAU, 1.0);
    assert!(at_pi.abs() < 1e-12);
    let approaching = footprint_attenuation(TAU * 0.99, 1.0);
    assert!(approaching > 0.0 && approaching < 0.02);
}

#[test]
fn attenuation_is_even_in_frequency() {
    let a = footprint_attenuation(1.3, 1.0);
    let b = footprint_attenuation(-1.3, 1.0);
    assert_eq!(a, b);
}

#[test]
fn footprint_width_tracks_rotation() {
    assert!((footprint_width(Affine::rotate(0.0)) - 1.0).abs() < 1e-12);
    assert!((footprint_width(Affine::rotate(std::f64::consts::FRAC_PI_2)) - 1.0).abs() < 1e-12);
    let diag = footprint_width(Affine::rotate(std::f64::consts::FRAC_PI_4));
    assert!((diag - std::f64::consts::SQRT_2).abs() < 1e-12);
}

#[test]
fn direct_sample_never_attenuates() {
    let params = StimulusParameters {
        contrast: 1.0,
        spatial_frequency: 20.0,
        envelope_sigma: 100.0,
        ..StimulusParameters::default()
    };
    let p = gabor(&params, 0.0);
    let FieldProgram::Gabor(u) = p else {
        unreachable!()
    };
    for frag in grid(64, 48) {
        let Point { x, y } = u.grating_coords(frag);
        let env = (-0.5 * (x * x + y * y) / (u.sigma_px * u.sigma_px)).exp();
        let carrier = (u.angular_frequency() * x + u.phase).cos();
        let expected = (0.5 + 0.5 * u.contrast * (env * carrier)).clamp(0.0, 1.0);
        assert_eq!(p.luminance(frag, AntiAliasMode::DirectSample), expected);
    }
}

#[test]
fn analytic_footprint_flattens_near_nyquist() {
    // 30 cpd at 60 px/deg is 0.5 cycles/px: s = π/2 for an axis-aligned grating. The quarter-cycle
    // phase puts the pixel centers on the carrier peaks.
    let params = StimulusParameters {
        contrast: 1.0,
        initial_phase: std::f64::consts::FRAC_PI_2,
        spatial_frequency: 30.0,
        envelope_sigma: 100.0,
        ..StimulusParameters::default()
    };
    let p = gabor(&params, 0.0);
    let gain = footprint_attenuation(TAU * 0.5, 1.0);
    assert!((gain - 2.0 / std::f64::consts::PI).abs() < 1e-12);

    let mut max_direct: f64 = 0.0;
    let mut max_filtered: f64 = 0.0;
    for frag in grid(64, 48) {
        max_direct = max_direct.max((p.luminance(frag, AntiAliasMode::DirectSample) - 0.5).abs());
        max_filtered =
            max_filtered.max((p.luminance(frag, AntiAliasMode::AnalyticFootprint) - 0.5).abs());
    }
    assert!(max_filtered < max_direct);
    assert!(max_filtered <= 0.5 * gain + 1e-9);
}

#[test]
fn shade_replicates_display_value() {
    let p = gabor(&StimulusParameters::default(), 0.0);
    let frag = Point::new(10.5, 20.5);
    let px = p.shade(frag, AntiAliasMode::DirectSample);
    assert_eq!(px.r, px.g);
    assert_eq!(px.g, px.b);
    assert_eq!(px.a, 255);
    assert_eq!(
        px.r,
        crate::foundation::core::quantize_unit(p.display_value(frag, AntiAliasMode::DirectSample))
    );
}

#[test]
fn evaluation_is_reproducible() {
    let params = StimulusParameters {
        temporal_frequency: 1.7,
        orientation: 12.0,
        ..StimulusParameters::default()
    };
    let a = gabor(&params, 3.3);
    let b = gabor(&params, 3.3);
    for frag in grid(64, 48) {
        assert_eq!(
            a.display_value(frag, AntiAliasMode::AnalyticFootprint).to_bits(),
            b.display_value(frag, AntiAliasMode::AnalyticFootprint).to_bits()
        );
    }
}
