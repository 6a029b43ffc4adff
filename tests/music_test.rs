//! Melody synthesizer tests
//!
//! Most tests step a `MelodySynth` through time on a scripted audio graph;
//! the last few run the real software mixer and the scheduling thread.

mod common;

use alphabuddy::music::melody::{PATTERN, SCALE};
use alphabuddy::music::{AudioGraph, MelodyPlayer, MelodySynth, SharedMixer, Waveform};
use common::{fake_graph, missing_graph, GraphHandle};
use std::thread;
use std::time::Duration;

const G4: f32 = 392.0;

/// Tick every 10 ms of graph time over `[from, to]` (in hundredths)
fn tick_through(synth: &mut MelodySynth, graph: &GraphHandle, from: u32, to: u32) {
    for i in from..=to {
        graph.set_time(i as f64 * 0.01);
        synth.tick();
    }
}

fn playing_synth() -> (MelodySynth, GraphHandle) {
    let (factory, graph, _) = fake_graph();
    let mut synth = MelodySynth::new(factory);
    synth.start();
    assert!(synth.is_playing());
    (synth, graph)
}

#[test]
fn test_first_note_is_layered() {
    let (mut synth, graph) = playing_synth();

    synth.tick();

    let started = graph.started();
    assert_eq!(started.len(), 3, "one note is three tones");
    assert_eq!(synth.active_tones(), 3);
    assert_eq!(synth.pattern_index(), 1);

    let layers: Vec<_> = started
        .iter()
        .map(|s| (s.tone.waveform, s.tone.frequency, s.tone.peak))
        .collect();
    assert_eq!(
        layers,
        vec![
            (Waveform::Sine, G4, 0.3),
            (Waveform::Triangle, G4 * 1.5, 0.2),
            (Waveform::Sine, G4 * 0.5, 0.15),
        ]
    );
    for s in &started {
        assert_eq!(s.tone.start, 0.0);
        assert_eq!(s.tone.duration, 0.3);
        assert_eq!(s.tone.fade, 0.05);
    }
}

#[test]
fn test_pattern_loops() {
    let (mut synth, graph) = playing_synth();

    tick_through(&mut synth, &graph, 0, 395);

    let melody = graph.melody();
    assert_eq!(melody.len(), 14, "13 notes plus the start of the next loop");

    let expected: Vec<f32> = PATTERN.iter().map(|&o| SCALE[(4 + o) % 8]).collect();
    assert_eq!(&melody[..13], &expected[..]);

    // The loop restarts on G4 3.9 s in
    assert_eq!(melody[13], G4);
    let restart = graph.started()[39].tone.start;
    assert!((3.9..3.92).contains(&restart), "restarted at {}", restart);
    assert_eq!(synth.pattern_index(), 1);
}

#[test]
fn test_notes_only_inside_window() {
    let (mut synth, graph) = playing_synth();

    tick_through(&mut synth, &graph, 0, 29);
    assert_eq!(graph.melody().len(), 1);

    // Second note due at 0.3 s
    tick_through(&mut synth, &graph, 30, 59);
    assert_eq!(graph.melody().len(), 2);

    let second = graph.started()[3].tone.start;
    assert!((0.3..0.32).contains(&second));
}

#[test]
fn test_finished_tones_are_forgotten() {
    let (mut synth, graph) = playing_synth();

    graph.set_time(0.0);
    synth.tick();
    graph.set_time(0.15);
    synth.tick();
    assert_eq!(synth.active_tones(), 3);

    graph.set_time(0.35);
    synth.tick();
    assert_eq!(synth.active_tones(), 6);

    // First note ended at 0.3 and is dropped 0.1 s later
    graph.set_time(0.41);
    synth.tick();
    assert_eq!(synth.active_tones(), 3);
}

#[test]
fn test_late_tick_reanchors() {
    let (mut synth, graph) = playing_synth();

    graph.set_time(0.0);
    synth.tick();

    // Stalled well past the second note's window
    graph.set_time(0.75);
    synth.tick();
    assert_eq!(graph.melody().len(), 2);
    assert_eq!(graph.started()[3].tone.start, 0.75);

    // The third note follows one note length after the late one
    graph.set_time(1.0);
    synth.tick();
    assert_eq!(graph.melody().len(), 2);
    graph.set_time(1.06);
    synth.tick();
    assert_eq!(graph.melody().len(), 3);
}

#[test]
fn test_stop_silences_everything() {
    let (mut synth, graph) = playing_synth();
    tick_through(&mut synth, &graph, 0, 35);
    assert_eq!(synth.active_tones(), 6);

    graph.set_time(0.36);
    synth.stop();

    assert!(!synth.is_playing());
    assert_eq!(synth.active_tones(), 0);

    let state = graph.state();
    let started: Vec<_> = state.started.iter().map(|s| s.id).collect();
    assert_eq!(state.stopped, started);
    assert_eq!(state.ramps.len(), 1);
    let (target, end) = state.ramps[0];
    assert_eq!(target, 0.0);
    assert!((end - 0.66).abs() < 1e-9);
    drop(state);

    // No more notes once stopped
    tick_through(&mut synth, &graph, 36, 100);
    assert_eq!(graph.melody().len(), 2);
}

#[test]
fn test_stop_when_idle_is_noop() {
    let (factory, graph, opened) = fake_graph();
    let mut synth = MelodySynth::new(factory);

    synth.stop();
    synth.stop();

    assert!(!synth.is_playing());
    assert_eq!(*opened.lock().unwrap(), 0);
    assert!(graph.state().ramps.is_empty());

    // Stopping twice after playing is also fine
    synth.start();
    synth.tick();
    synth.stop();
    synth.stop();
    assert_eq!(graph.state().ramps.len(), 1);
}

#[test]
fn test_double_start_keeps_one_schedule() {
    let (factory, graph, opened) = fake_graph();
    let mut synth = MelodySynth::new(factory);

    synth.start();
    tick_through(&mut synth, &graph, 0, 10);
    synth.start();
    assert_eq!(synth.pattern_index(), 1, "second start doesn't restart the pattern");

    tick_through(&mut synth, &graph, 11, 100);
    // Notes at 0.0, 0.3, 0.6 and 0.9, once each
    assert_eq!(graph.melody().len(), 4);
    assert_eq!(*opened.lock().unwrap(), 1, "graph opened once");
}

#[test]
fn test_start_resumes_suspended_device() {
    let (factory, graph, _) = fake_graph();
    graph.state().suspended = true;
    let mut synth = MelodySynth::new(factory);

    synth.start();
    assert_eq!(graph.state().resumes, 1);
    assert!(!graph.state().suspended);

    // Already playing, but the device got suspended again
    graph.state().suspended = true;
    synth.start();
    assert_eq!(graph.state().resumes, 2);
    assert!(synth.is_playing());
}

#[test]
fn test_volume_is_clamped() {
    let (mut synth, graph) = playing_synth();
    assert_eq!(synth.volume(), 0.12);
    assert_eq!(graph.state().master, 0.12);

    synth.set_volume(1.5);
    assert_eq!(synth.volume(), 1.0);
    assert_eq!(graph.state().master, 1.0);

    synth.set_volume(-1.0);
    assert_eq!(synth.volume(), 0.0);
    assert_eq!(graph.state().master, 0.0);

    synth.set_volume(f32::NAN);
    assert_eq!(synth.volume(), 0.0);
}

#[test]
fn test_volume_before_start_applies_on_start() {
    let (factory, graph, _) = fake_graph();
    let mut synth = MelodySynth::new(factory).with_volume(0.5);

    assert_eq!(graph.state().master, 1.0, "graph not opened yet");
    synth.start();
    assert_eq!(graph.state().master, 0.5);
}

#[test]
fn test_restart_restores_volume() {
    let (mut synth, graph) = playing_synth();
    synth.tick();
    synth.stop();
    assert_eq!(graph.state().master, 0.0);

    graph.set_time(1.0);
    synth.start();
    assert_eq!(graph.state().master, 0.12);
    assert_eq!(synth.pattern_index(), 0);

    synth.tick();
    assert_eq!(graph.melody(), vec![G4, G4]);
}

#[test]
fn test_missing_device_stays_idle() {
    let mut synth = MelodySynth::new(missing_graph());

    synth.start();
    assert!(!synth.is_playing());
    synth.tick();
    synth.set_volume(0.3);
    assert_eq!(synth.volume(), 0.3);
    synth.stop();
    assert_eq!(synth.active_tones(), 0);
}

#[test]
fn test_refused_tone_drops_note() {
    let (mut synth, graph) = playing_synth();
    graph.state().reject_tones = true;

    synth.tick();

    assert_eq!(synth.active_tones(), 0);
    assert!(graph.started().is_empty());
    // The pattern moves on regardless
    assert_eq!(synth.pattern_index(), 1);
}

#[test]
fn test_mixer_renders_melody() {
    let mixer = SharedMixer::new(8000.0);
    let graph = mixer.clone();
    let mut synth = MelodySynth::new(Box::new(move || {
        Ok(Box::new(graph.clone()) as Box<dyn AudioGraph>)
    }));

    synth.start();
    synth.tick();
    assert_eq!(mixer.active_tones(), 3);

    let mut buffer = vec![0.0f32; 800];
    mixer.render(&mut buffer);
    let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.0, "melody should be audible");
    assert!(peak <= 0.12 * 0.65 + 1e-3, "peak {} above master volume", peak);

    // Past the end of the note the mixer drops its tones
    mixer.advance(0.3);
    assert_eq!(mixer.active_tones(), 0);

    synth.stop();
    assert_eq!(mixer.active_tones(), 0);
}

#[test]
fn test_player_runs_one_loop() {
    let (factory, graph, _) = fake_graph();
    let mut player = MelodyPlayer::new(MelodySynth::new(factory), Duration::from_millis(2));

    player.start();
    player.start();
    assert!(player.is_playing());
    assert!(player.is_scheduling());

    thread::sleep(Duration::from_millis(50));

    // Graph time stands still, so only the first note ever plays
    assert_eq!(graph.melody(), vec![G4]);
    assert_eq!(player.with_synth(|s| s.pattern_index()), 1);

    player.stop();
    assert!(!player.is_playing());
    assert!(!player.is_scheduling());
    assert_eq!(graph.state().stopped.len(), 3);
}

#[test]
fn test_player_volume_and_restart() {
    let (factory, graph, _) = fake_graph();
    let mut player = MelodyPlayer::new(MelodySynth::new(factory), Duration::from_millis(2));

    player.start();
    player.set_volume(2.0);
    assert_eq!(player.with_synth(|s| s.volume()), 1.0);

    player.stop();
    player.start();
    assert!(player.is_scheduling());
    assert_eq!(graph.state().master, 1.0);
    player.stop();
}

#[test]
fn test_player_without_device() {
    let mut player = MelodyPlayer::new(MelodySynth::new(missing_graph()), Duration::from_millis(2));

    player.start();
    assert!(!player.is_playing());
    assert!(!player.is_scheduling());
    player.stop();
}
