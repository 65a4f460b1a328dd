#![feature(test)]

use std::sync::Arc;

use clustergen::matrix::Matrix;
use clustergen::mlpg::{ParameterGenerator, PdfStream};
use clustergen::window::Windows;
use clustergen::{
    Cluster, DurationStat, DurationStats, Engine, FrameContext, ParameterModels, PhoneStateTable,
    Segment, StateContext, Voice, VoiceConfig,
};
use test::Bencher;

extern crate test;

const ORDER: usize = 25;

fn duration(_: &StateContext) -> f64 {
    0.5
}

fn f0(context: &FrameContext) -> f64 {
    110.0 + (context.frame % 40) as f64
}

fn cluster(context: &FrameContext) -> Cluster {
    let position = context.position as f64;
    let means = (0..ORDER * 2)
        .map(|i| match i {
            0 => 4.0,
            i if i < ORDER => 0.5 / i as f64 + 0.01 * position,
            _ => 0.0,
        })
        .collect();
    Cluster {
        f0: 120.0,
        means,
        stddevs: vec![0.1; ORDER * 2],
        band_strengths: Vec::new(),
        voicing: 1.0,
    }
}

fn voice() -> Voice {
    let phones = ["pau", "k", "o", "N", "n", "i", "ch", "w", "a"];
    let mut phone_states = Vec::new();
    let mut durations = Vec::new();
    for phone in phones {
        let states: Vec<String> = (1..=3).map(|i| format!("{phone}_{i}")).collect();
        for state in &states {
            durations.push((
                state.clone(),
                DurationStat {
                    mean: 0.0325,
                    stddev: 0.01,
                },
            ));
        }
        phone_states.push((phone.to_string(), states));
    }

    Voice {
        config: VoiceConfig {
            mlsa_beta: 0.4,
            ..Default::default()
        },
        spectrum_dimension: ORDER,
        windows: Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap(),
        phone_states: PhoneStateTable::new(phone_states),
        durations: DurationStats::new(durations),
        shaping_filters: None,
        duration_model: Box::new(duration),
        f0_model: Box::new(f0),
        parameter_models: ParameterModels::Single(Box::new(cluster)),
    }
}

fn konnichiwa() -> Vec<Segment> {
    ["pau", "k", "o", "N", "n", "i", "ch", "i", "w", "a", "pau"]
        .into_iter()
        .map(|name| Segment::new(name, matches!(name, "o" | "i" | "a")))
        .collect()
}

#[bench]
fn synthesize(bencher: &mut Bencher) {
    let engine = Engine::new(Arc::new(voice()));
    let segments = konnichiwa();

    bencher.iter(|| {
        engine.synthesize(&segments).unwrap();
    });
}

#[bench]
fn generate_parameters(bencher: &mut Bencher) {
    let engine = Engine::new(Arc::new(voice()));
    let segments = konnichiwa();

    bencher.iter(|| {
        engine.generate_parameters(&segments).unwrap();
    });
}

#[bench]
fn mlpg(bencher: &mut Bencher) {
    let frames = 400;
    let means: Vec<Vec<f64>> = (0..frames)
        .map(|t| (0..ORDER * 2).map(|i| ((t * i) % 7) as f64 * 0.1).collect())
        .collect();
    let means = Matrix::from_rows(&means).unwrap();
    let stddevs = Matrix::from_rows(&vec![vec![0.2; ORDER * 2]; frames]).unwrap();
    let pdf = PdfStream::from_stddevs(2, &means, &stddevs).unwrap();
    let windows = Windows::with_delta(vec![-0.5, 0.0, 0.5]).unwrap();

    bencher.iter(|| {
        ParameterGenerator::new(&windows).generate(&pdf).unwrap();
    });
}
