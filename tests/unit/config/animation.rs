use super::*;

#[test]
fn transition_names_parse_with_aliases() {
    assert_eq!(parse_transition(" Fade ").unwrap(), TransitionKind::Fade);
    assert_eq!(parse_transition("crossfade").unwrap(), TransitionKind::Fade);
    assert_eq!(parse_transition("DISSOLVE").unwrap(), TransitionKind::Dissolve);
    assert_eq!(parse_transition("none").unwrap(), TransitionKind::None);
    assert!(parse_transition("").is_err());
    assert!(parse_transition("wipe").is_err());
}

#[test]
fn clamped_respects_engine_limits() {
    let engine = EngineConfig::default();
    let cfg = AnimationConfig {
        fps: 500.0,
        trail_length: 0,
        trail_opacity: 3.0,
        transition_duration: -1.0,
        ..AnimationConfig::default()
    }
    .clamped(&engine);
    assert_eq!(cfg.fps, engine.fps.max);
    assert_eq!(cfg.trail_length, 1);
    assert_eq!(cfg.trail_opacity, 1.0);
    assert_eq!(cfg.transition_duration, 0.0);

    let slow = AnimationConfig {
        fps: 0.01,
        trail_length: 99,
        ..AnimationConfig::default()
    }
    .clamped(&engine);
    assert_eq!(slow.fps, engine.fps.min);
    assert_eq!(slow.trail_length, engine.max_trail_length);
}

#[test]
fn transition_steps_follow_ceil_rule() {
    let cfg = AnimationConfig {
        fps: 24.0,
        transition: TransitionKind::Fade,
        transition_duration: 0.5,
        ..AnimationConfig::default()
    };
    assert_eq!(cfg.transition_steps(), 12);

    let short = AnimationConfig {
        fps: 2.0,
        transition_duration: 0.1,
        ..cfg.clone()
    };
    assert_eq!(short.transition_steps(), 1);

    let off = AnimationConfig {
        transition: TransitionKind::None,
        ..cfg
    };
    assert_eq!(off.transition_steps(), 1);
}

#[test]
fn serde_uses_lowercase_transition_names() {
    let cfg: AnimationConfig =
        serde_json::from_str(r#"{ "fps": 12, "transition": "dissolve" }"#).unwrap();
    assert_eq!(cfg.transition, TransitionKind::Dissolve);
    assert_eq!(cfg.trail_length, 3);
}

#[test]
fn clamped_survives_an_unvalidated_inverted_fps_range() {
    let mut engine = EngineConfig::default();
    engine.fps = crate::config::engine::FpsLimits { min: 30.0, max: 5.0 };
    engine.max_trail_length = 0;
    assert!(engine.validate().is_err());

    let cfg = AnimationConfig {
        fps: 12.0,
        trail_length: 4,
        ..AnimationConfig::default()
    }
    .clamped(&engine);
    assert_eq!(cfg.fps, 5.0);
    assert_eq!(cfg.trail_length, 1);

    engine.fps = crate::config::engine::FpsLimits { min: -3.0, max: -1.0 };
    let fallback = AnimationConfig::default().clamped(&engine);
    assert_eq!(fallback.fps, AnimationConfig::default().fps);
    assert!(fallback.tick_ms().is_finite());
}
