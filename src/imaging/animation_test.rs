use image::Rgba;

use super::*;

const EPSILON: f32 = 1e-6;

fn opaque_green(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([0, 200, 0, 255]))
}

#[test]
fn interpolation_endpoints_are_exact() {
    let spec = AnimationSpec { frame_count: 5, start_scale: 0.5, ..AnimationSpec::default() };
    let first = interpolate(&spec, 0);
    let last = interpolate(&spec, 4);
    assert!(first.opacity.abs() < EPSILON);
    assert!((first.scale - 0.5).abs() < EPSILON);
    assert!((last.opacity - 1.0).abs() < EPSILON);
    assert!((last.scale - 1.0).abs() < EPSILON);
}

#[test]
fn interpolation_is_linear() {
    let spec = AnimationSpec { frame_count: 11, start_scale: 0.6, ..AnimationSpec::default() };
    for i in 0..11 {
        let p = interpolate(&spec, i);
        #[allow(clippy::cast_precision_loss)]
        let t = i as f32 / 10.0;
        assert!((p.opacity - t).abs() < EPSILON);
        assert!((p.scale - (0.6 + 0.4 * t)).abs() < EPSILON);
    }
}

#[test]
fn effects_select_channels() {
    let fade = AnimationSpec { effect: AnimationEffect::Fade, ..AnimationSpec::default() };
    assert!((interpolate(&fade, 0).scale - 1.0).abs() < EPSILON);
    assert!(interpolate(&fade, 0).opacity.abs() < EPSILON);

    let zoom = AnimationSpec { effect: AnimationEffect::Zoom, ..AnimationSpec::default() };
    assert!((interpolate(&zoom, 0).opacity - 1.0).abs() < EPSILON);
    assert!((interpolate(&zoom, 0).scale - DEFAULT_START_SCALE).abs() < EPSILON);
}

#[test]
fn index_past_end_is_clamped() {
    let spec = AnimationSpec { frame_count: 3, ..AnimationSpec::default() };
    assert_eq!(interpolate(&spec, 99), interpolate(&spec, 2));
}

#[test]
fn validate_bounds() {
    assert!(AnimationSpec::default().validate().is_ok());
    let bad = |spec: AnimationSpec| spec.validate().unwrap_err();
    assert_eq!(bad(AnimationSpec { frame_count: 1, ..AnimationSpec::default() }), AnimationError::FrameCount(1));
    assert_eq!(bad(AnimationSpec { frame_count: 61, ..AnimationSpec::default() }), AnimationError::FrameCount(61));
    assert_eq!(bad(AnimationSpec { start_scale: 0.0, ..AnimationSpec::default() }), AnimationError::StartScale(0.0));
    assert_eq!(bad(AnimationSpec { start_scale: 1.5, ..AnimationSpec::default() }), AnimationError::StartScale(1.5));
    assert_eq!(bad(AnimationSpec { frame_delay_ms: 0, ..AnimationSpec::default() }), AnimationError::FrameDelay(0));
}

#[test]
fn frames_are_named_and_sized() {
    let spec = AnimationSpec { frame_count: 4, ..AnimationSpec::default() };
    let frames = generate_frames(&opaque_green(30, 20), &spec).unwrap();
    assert_eq!(frames.len(), 4);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index, i + 1);
        assert_eq!(frame.file_name, format!("signature-frame-{}.png", i + 1));
        assert_eq!(frame.image.dimensions(), (30, 20));
    }
}

#[test]
fn fade_starts_invisible_and_ends_opaque() {
    let spec = AnimationSpec { frame_count: 3, effect: AnimationEffect::Fade, ..AnimationSpec::default() };
    let frames = generate_frames(&opaque_green(10, 10), &spec).unwrap();
    assert_eq!(frames[0].image.get_pixel(5, 5).0[3], 0);
    let mid = frames[1].image.get_pixel(5, 5).0[3];
    assert!((120..=135).contains(&mid), "mid alpha {mid}");
    assert!(frames[2].image.get_pixel(5, 5).0[3] > 250);
}

#[test]
fn zoom_leaves_border_uncovered_on_first_frame() {
    let spec = AnimationSpec {
        frame_count: 2,
        effect: AnimationEffect::Zoom,
        start_scale: 0.5,
        ..AnimationSpec::default()
    };
    let frames = generate_frames(&opaque_green(40, 40), &spec).unwrap();
    // Scaled to half size around the center: corners are empty.
    assert_eq!(frames[0].image.get_pixel(1, 1).0[3], 0);
    assert!(frames[0].image.get_pixel(20, 20).0[3] > 250);
    assert!(frames[1].image.get_pixel(1, 1).0[3] > 250);
}

#[test]
fn background_fills_uncovered_area() {
    let spec = AnimationSpec {
        frame_count: 2,
        effect: AnimationEffect::Fade,
        background: Some([255, 255, 255, 255]),
        ..AnimationSpec::default()
    };
    let frames = generate_frames(&opaque_green(8, 8), &spec).unwrap();
    assert_eq!(frames[0].image.get_pixel(4, 4), &Rgba([255, 255, 255, 255]));
}

#[test]
fn invalid_spec_is_rejected_before_rendering() {
    let spec = AnimationSpec { frame_count: 0, ..AnimationSpec::default() };
    assert!(matches!(generate_frames(&opaque_green(4, 4), &spec), Err(AnimationError::FrameCount(0))));
}

#[test]
fn budget_limits_edge_and_total_pixels() {
    let spec = AnimationSpec { frame_count: MAX_FRAMES, ..AnimationSpec::default() };
    assert!(spec.check_budget(512, 512).is_ok());
    assert_eq!(
        spec.check_budget(1024, 1024),
        Err(AnimationError::TooLarge { width: 1024, height: 1024, frames: MAX_FRAMES })
    );

    let short = AnimationSpec { frame_count: 10, ..AnimationSpec::default() };
    assert!(short.check_budget(MAX_ANIMATION_EDGE_PX, MAX_ANIMATION_EDGE_PX).is_ok());
    assert!(short.check_budget(MAX_ANIMATION_EDGE_PX + 1, 1).is_err());
    assert!(short.check_budget(4096, 4096).is_err());
}

#[test]
fn oversized_source_is_rejected_before_rendering() {
    let spec = AnimationSpec { frame_count: 2, ..AnimationSpec::default() };
    let err = generate_frames(&opaque_green(MAX_ANIMATION_EDGE_PX + 1, 1), &spec).unwrap_err();
    assert!(matches!(err, AnimationError::TooLarge { width: 1025, height: 1, frames: 2 }));
    assert_eq!(err.error_code(), "E_ANIMATION_TOO_LARGE");
    assert_eq!(err.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
}

#[test]
fn effect_parse() {
    assert_eq!(AnimationEffect::parse("Fade"), Some(AnimationEffect::Fade));
    assert_eq!(AnimationEffect::parse("fade-zoom"), Some(AnimationEffect::FadeZoom));
    assert_eq!(AnimationEffect::parse("spin"), None);
}
