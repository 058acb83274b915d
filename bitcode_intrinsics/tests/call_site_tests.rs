//! Call site cache protocol: bounded growth, monotonic demotion and
//! concurrent use.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use bitcode_intrinsics::prelude::*;
use common::{init_logging, RecordingMemory};

fn abs_operands() -> Vec<(NumericValue, NumericValue)> {
    vec![
        (NumericValue::Int32(-3), NumericValue::Int32(3)),
        (NumericValue::Int64(-4), NumericValue::Int64(4)),
        (NumericValue::Float32(-1.5), NumericValue::Float32(1.5)),
        (NumericValue::Float64(-2.5), NumericValue::Float64(2.5)),
        (
            NumericValue::from(Extended80::from_f64(-0.5)),
            NumericValue::from(Extended80::from_f64(0.5)),
        ),
        (
            NumericValue::from(Vector::new(vec![-1.0f32, 2.0])),
            NumericValue::from(Vector::new(vec![1.0f32, 2.0])),
        ),
        (
            NumericValue::from(Vector::new(vec![-0.0f64, -8.0, 8.0])),
            NumericValue::from(Vector::new(vec![0.0f64, 8.0, 8.0])),
        ),
    ]
}

#[test]
fn test_cache_never_exceeds_limit() {
    init_logging();
    let engine = DispatchEngine::default();
    let site = engine.call_site(Operation::Abs);
    let mut mem = RecordingMemory::new();

    for (round, (input, expected)) in abs_operands().into_iter().enumerate() {
        let r = site.call(&[input], &mut mem).unwrap();
        assert_eq!(r, expected);
        assert!(site.len() <= 2);
        let expected_state = match round {
            0 => CacheState::Specializing(1),
            1 => CacheState::Specializing(2),
            _ => CacheState::Generic,
        };
        assert_eq!(site.state(), expected_state);
    }

    let stats = site.stats();
    assert_eq!(stats.installs, 2);
    assert_eq!(stats.generic_runs, 5);
}

#[test]
fn test_demotion_is_monotonic() {
    let engine = DispatchEngine::default();
    let site = engine.call_site(Operation::Sqrt);
    let mut mem = RecordingMemory::new();

    site.call(&[NumericValue::Float64(4.0)], &mut mem).unwrap();
    site.call(&[NumericValue::Float32(4.0)], &mut mem).unwrap();
    assert_eq!(site.state(), CacheState::Specializing(2));

    // a third shape at a full site demotes it, even when the generic path
    // then rejects the shape
    let err = site.call(&[NumericValue::Int64(4)], &mut mem).unwrap_err();
    assert!(matches!(err, RuntimeError::UnsupportedOperands { .. }));
    assert_eq!(site.state(), CacheState::Generic);
    assert_eq!(site.len(), 2);

    for _ in 0..10 {
        let r = site.call(&[NumericValue::Float64(9.0)], &mut mem).unwrap();
        assert_eq!(r, NumericValue::Float64(3.0));
        assert_eq!(site.state(), CacheState::Generic);
    }
}

#[test]
fn test_configured_limit() {
    let config = EngineConfig {
        cache_limit: 4,
        ..EngineConfig::default()
    };
    let site = DispatchEngine::new(config).call_site(Operation::Abs);
    let mut mem = RecordingMemory::new();
    for (input, expected) in abs_operands() {
        assert_eq!(site.call(&[input], &mut mem).unwrap(), expected);
    }
    assert_eq!(site.limit(), 4);
    assert_eq!(site.len(), 4);
    assert_eq!(site.state(), CacheState::Generic);
}

#[test]
fn test_lane_count_is_not_part_of_the_shape() {
    let site = DispatchEngine::default().call_site(Operation::Floor);
    let mut mem = RecordingMemory::new();
    for lanes in 1..6 {
        let v = Vector::new((0..lanes).map(|i| i as f32 + 0.5).collect());
        let r = site.call(&[NumericValue::from(v)], &mut mem).unwrap();
        let expected = Vector::new((0..lanes).map(|i| i as f32).collect());
        assert_eq!(r, NumericValue::from(expected));
    }
    assert_eq!(site.state(), CacheState::Specializing(1));
    assert_eq!(site.stats().hits, 4);
}

#[test]
fn test_concurrent_calls_share_one_site() {
    init_logging();
    let engine = DispatchEngine::default();
    let site = engine.call_site(Operation::Abs);
    let operands = abs_operands();
    let checked = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for t in 0..8 {
            let site = &site;
            let operands = &operands;
            let checked = &checked;
            s.spawn(move || {
                let mut mem = RecordingMemory::new();
                for i in 0..200 {
                    let (input, expected) = &operands[(t + i) % operands.len()];
                    let r = site.call(std::slice::from_ref(input), &mut mem).unwrap();
                    assert_eq!(&r, expected);
                    assert!(site.len() <= site.limit());
                    checked.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });

    assert_eq!(checked.load(Ordering::Relaxed), 1600);
    assert!(site.len() <= 2);
    assert_eq!(site.state(), CacheState::Generic);
}

#[test]
fn test_concurrent_single_shape_installs_once_per_slot() {
    let engine = DispatchEngine::new(EngineConfig {
        cache_limit: 3,
        ..EngineConfig::default()
    });
    let site = engine.call_site(Operation::Sqrt);

    std::thread::scope(|s| {
        for _ in 0..8 {
            let site = &site;
            s.spawn(move || {
                let mut mem = RecordingMemory::new();
                for _ in 0..100 {
                    let r = site.call(&[NumericValue::Float64(16.0)], &mut mem).unwrap();
                    assert_eq!(r, NumericValue::Float64(4.0));
                }
            });
        }
    });

    // racing threads resolve the same shape; the losers reuse the winner's slot
    assert_eq!(site.len(), 1);
    assert_eq!(site.state(), CacheState::Specializing(1));
    let stats = site.stats();
    assert_eq!(stats.installs, 1);
    assert_eq!(stats.hits + stats.installs, 800);
}
