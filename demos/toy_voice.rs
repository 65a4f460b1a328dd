use std::sync::Arc;

use clustergen::window::Windows;
use clustergen::{
    Cluster, DurationStat, DurationStats, Engine, FrameContext, ParameterModels, PhoneStateTable,
    Segment, StateContext, Voice, VoiceConfig,
};

fn duration(_: &StateContext) -> f64 {
    0.0
}

fn f0(context: &FrameContext) -> f64 {
    // slow declination over the utterance
    130.0 - 20.0 * context.time
}

fn spectrum(context: &FrameContext) -> Cluster {
    let (c1, voicing) = match context.segment().name.as_str() {
        "a" => (0.6, 1.0),
        "i" => (-0.3, 1.0),
        "s" => (-0.8, 0.0),
        _ => (0.0, 0.0),
    };
    let c0 = if context.segment().name == "pau" { -4.0 } else { 4.5 };
    Cluster {
        f0: 120.0,
        means: vec![c0, c1, 0.1, 0.0, 0.0, 0.0],
        stddevs: vec![0.3, 0.2, 0.1, 0.05, 0.05, 0.05],
        band_strengths: Vec::new(),
        voicing,
    }
}

fn voice() -> clustergen::Result<Voice> {
    let phones = ["pau", "a", "i", "s"];
    let mut phone_states = Vec::new();
    let mut durations = Vec::new();
    for phone in phones {
        let states: Vec<String> = (1..=3).map(|i| format!("{phone}_{i}")).collect();
        for state in &states {
            durations.push((
                state.clone(),
                DurationStat {
                    mean: 0.04,
                    stddev: 0.01,
                },
            ));
        }
        phone_states.push((phone.to_string(), states));
    }

    Ok(Voice {
        config: VoiceConfig {
            f0_mean: 120.0,
            f0_stddev: 15.0,
            mlsa_beta: 0.3,
            ..Default::default()
        },
        spectrum_dimension: 3,
        windows: Windows::with_delta(vec![-0.5, 0.0, 0.5])?,
        phone_states: PhoneStateTable::new(phone_states),
        durations: DurationStats::new(durations),
        shaping_filters: None,
        duration_model: Box::new(duration),
        f0_model: Box::new(f0),
        parameter_models: ParameterModels::Single(Box::new(spectrum)),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::init_with_level(log::Level::Debug)?;

    let segments = [
        Segment::new("pau", false),
        Segment::new("a", true),
        Segment::new("s", false),
        Segment::new("i", true),
        Segment::new("pau", false),
    ];

    let mut engine = Engine::new(Arc::new(voice()?));
    for option in std::env::args().skip(1) {
        engine.condition.apply_option(&option);
    }

    let waveform = engine.synthesize(&segments)?;

    println!(
        "The synthesized voice has {} samples ({:.2} s) in total.",
        waveform.len(),
        waveform.duration()
    );

    let mut writer = hound::WavWriter::create(
        "toy_voice.wav",
        hound::WavSpec {
            channels: 1,
            sample_rate: waveform.sample_rate as u32,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        },
    )?;
    for &sample in &waveform.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
