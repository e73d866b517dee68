//! Press/release report state machine.
//!
//! Each detected detent produces exactly one key-down report followed,
//! on the next tick where the endpoint is ready, by exactly one key-up
//! report. While the key-up is owed no new step is classified.
//!
//! ```text
//!            ready, step != 0: send press
//!   ┌──────┐ ─────────────────────────────> ┌──────────────────────────┐
//!   │ Idle │                                │ KeyDownPendingRelease    │
//!   └──────┘ <───────────────────────────── └──────────────────────────┘
//!            ready: send release
//! ```
//!
//! A tick on which the transport is not ready does nothing at all: no
//! sample, no baseline update, no report. The owed transition simply
//! waits for the next ready tick.

use crate::config::KnobConfig;
use crate::gray::{classify, Position, Step};
use crate::report::{HidTransport, KeyboardReport};
use crate::sampler::PositionSource;

/// Whether a key-up report is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmitterState {
    /// No report owed; the next ready tick looks for a step.
    Idle,
    /// A key-down report was sent and its key-up is still owed.
    KeyDownPendingRelease,
}

/// What a single [`ReportEmitter::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// The transport was not ready; nothing was sampled or sent.
    NotReady,
    /// The owed key-up report was sent.
    Released,
    /// A step was detected and its key-down report was sent.
    Pressed(Step),
    /// Sampled, but there was no step to report.
    Idle,
}

/// Decoder and report state owned by the polling loop.
///
/// Nothing outside [`tick`](Self::tick) mutates this state; USB lifecycle
/// events are handled elsewhere and never reach it.
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    config: KnobConfig,
    state: EmitterState,
    previous: Position,
    last_delta: i8,
}

impl ReportEmitter {
    /// Create an emitter with an explicit baseline position.
    pub fn new(baseline: Position, config: KnobConfig) -> Self {
        Self {
            config,
            state: EmitterState::Idle,
            previous: baseline,
            last_delta: 0,
        }
    }

    /// Create an emitter whose baseline is one eager sample, so the first
    /// tick compares against the real knob position and cannot fire
    /// spuriously.
    pub fn start<S: PositionSource>(source: &mut S, config: KnobConfig) -> Result<Self, S::Error> {
        let baseline = source.sample()?;

        #[cfg(feature = "defmt")]
        defmt::info!("knob baseline position {}", baseline.index());

        Ok(Self::new(baseline, config))
    }

    /// Current state of the press/release cycle.
    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// Position the next sample will be classified against.
    pub fn previous(&self) -> Position {
        self.previous
    }

    /// Delta computed by the most recent classifying tick.
    pub fn last_delta(&self) -> i8 {
        self.last_delta
    }

    /// Run one pipeline step. Call once per poll interval.
    ///
    /// Only a failing pin read can return an error; in that case the
    /// state is left untouched and the tick can simply be retried.
    pub fn tick<S, T>(&mut self, source: &mut S, transport: &mut T) -> Result<TickOutcome, S::Error>
    where
        S: PositionSource,
        T: HidTransport,
    {
        if self.config.wake_host_on_suspend && transport.is_suspended() {
            transport.remote_wakeup();
        }

        if !transport.is_ready() {
            return Ok(TickOutcome::NotReady);
        }

        match self.state {
            EmitterState::KeyDownPendingRelease => {
                // Baseline keeps tracking the knob, but no step is looked for.
                let current = source.sample()?;
                self.send(transport, KeyboardReport::release());
                self.state = EmitterState::Idle;
                self.previous = current;
                Ok(TickOutcome::Released)
            }
            EmitterState::Idle => {
                let current = source.sample()?;
                let delta = classify(self.previous, current);
                let step = Step::from_delta(delta);
                self.last_delta = delta;

                let outcome = match step {
                    Step::Clockwise => {
                        self.send(transport, KeyboardReport::press(self.config.clockwise));
                        self.state = EmitterState::KeyDownPendingRelease;
                        TickOutcome::Pressed(step)
                    }
                    Step::CounterClockwise => {
                        self.send(transport, KeyboardReport::press(self.config.counter_clockwise));
                        self.state = EmitterState::KeyDownPendingRelease;
                        TickOutcome::Pressed(step)
                    }
                    Step::None => TickOutcome::Idle,
                };

                #[cfg(feature = "defmt")]
                if step.is_step() {
                    defmt::debug!(
                        "knob {} -> {}: delta={} {}",
                        self.previous.index(),
                        current.index(),
                        delta,
                        step
                    );
                }

                self.previous = current;
                Ok(outcome)
            }
        }
    }

    fn send<T: HidTransport>(&self, transport: &mut T, report: KeyboardReport) {
        transport.send_keyboard_report(self.config.report_id, report.modifier, report.keycodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyBinding;
    use crate::gray::GRAY_TABLE;
    use crate::report::{KEY_BACKSLASH, KEY_BRACKET_RIGHT};

    fn pos(index: u8) -> Position {
        Position::new(index).unwrap()
    }

    /// Position source that replays raw pin codes, repeating the last one.
    struct ScriptedPins {
        raw: Vec<u8>,
        reads: usize,
    }

    impl ScriptedPins {
        fn new(raw: &[u8]) -> Self {
            Self {
                raw: raw.to_vec(),
                reads: 0,
            }
        }

        /// Script that walks the given ring positions.
        fn positions(indices: &[u8]) -> Self {
            let raw: Vec<u8> = indices
                .iter()
                .map(|&i| GRAY_TABLE.iter().position(|&p| p == i).unwrap() as u8)
                .collect();
            Self::new(&raw)
        }
    }

    impl PositionSource for ScriptedPins {
        type Error = ();

        fn sample(&mut self) -> Result<Position, ()> {
            let raw = self.raw[self.reads.min(self.raw.len() - 1)];
            self.reads += 1;
            Ok(Position::decode(raw))
        }
    }

    struct FailingPins;

    impl PositionSource for FailingPins {
        type Error = &'static str;

        fn sample(&mut self) -> Result<Position, &'static str> {
            Err("pin read failed")
        }
    }

    /// Transport that records every report it was given.
    #[derive(Default)]
    struct RecordingTransport {
        not_ready: bool,
        suspended: bool,
        sent: Vec<(u8, KeyboardReport)>,
        wakeups: usize,
    }

    impl HidTransport for RecordingTransport {
        fn is_ready(&self) -> bool {
            !self.not_ready
        }

        fn send_keyboard_report(&mut self, report_id: u8, modifier: u8, keycodes: [u8; 6]) {
            self.sent.push((report_id, KeyboardReport { modifier, keycodes }));
        }

        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn remote_wakeup(&mut self) {
            self.wakeups += 1;
        }
    }

    fn cw() -> KeyboardReport {
        KeyboardReport::press(KeyBinding::key(KEY_BACKSLASH))
    }

    fn ccw() -> KeyboardReport {
        KeyboardReport::press(KeyBinding::key(KEY_BRACKET_RIGHT))
    }

    fn reports(transport: &RecordingTransport) -> Vec<KeyboardReport> {
        transport.sent.iter().map(|&(_, r)| r).collect()
    }

    // ── Startup ──────────────────────────────────────────────────────

    #[test]
    fn start_takes_baseline_from_first_sample() {
        let mut pins = ScriptedPins::positions(&[6]);
        let emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();
        assert_eq!(emitter.previous(), pos(6));
        assert_eq!(emitter.state(), EmitterState::Idle);
        assert_eq!(pins.reads, 1);
    }

    #[test]
    fn first_tick_at_rest_does_not_fire() {
        let mut pins = ScriptedPins::positions(&[6, 6]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn start_propagates_pin_error() {
        let result = ReportEmitter::start(&mut FailingPins, KnobConfig::default());
        assert_eq!(result.unwrap_err(), "pin read failed");
    }

    // ── Press / release pairing ──────────────────────────────────────

    #[test]
    fn clockwise_step_presses_then_releases() {
        let mut pins = ScriptedPins::positions(&[3, 4, 4, 4]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        assert_eq!(
            emitter.tick(&mut pins, &mut transport),
            Ok(TickOutcome::Pressed(Step::Clockwise))
        );
        assert_eq!(emitter.state(), EmitterState::KeyDownPendingRelease);
        assert_eq!(emitter.last_delta(), 1);

        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Released));
        assert_eq!(emitter.state(), EmitterState::Idle);

        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert_eq!(reports(&transport), [cw(), KeyboardReport::release()]);
    }

    #[test]
    fn counter_clockwise_step_uses_its_own_key() {
        let mut pins = ScriptedPins::positions(&[0, 15, 15]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        assert_eq!(
            emitter.tick(&mut pins, &mut transport),
            Ok(TickOutcome::Pressed(Step::CounterClockwise))
        );
        assert_eq!(emitter.last_delta(), -1);
        emitter.tick(&mut pins, &mut transport).unwrap();

        assert_eq!(reports(&transport), [ccw(), KeyboardReport::release()]);
    }

    #[test]
    fn movement_during_pending_release_only_moves_baseline() {
        // Step to 1, then the knob keeps turning to 2 while the release is owed.
        let mut pins = ScriptedPins::positions(&[0, 1, 2, 2]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        emitter.tick(&mut pins, &mut transport).unwrap();
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Released));
        assert_eq!(emitter.previous(), pos(2));

        // 2 -> 2: the swallowed detent is not replayed.
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn every_press_is_followed_by_exactly_one_release() {
        let walk: Vec<u8> = (0..=16u8).map(|i| i % 16).collect();
        let mut pins = ScriptedPins::positions(&walk);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        for _ in 0..32 {
            emitter.tick(&mut pins, &mut transport).unwrap();
        }

        let sent = reports(&transport);
        assert!(!sent.is_empty());
        for pair in sent.chunks(2) {
            assert!(!pair[0].is_release());
            if let Some(second) = pair.get(1) {
                assert!(second.is_release());
            }
        }
    }

    #[test]
    fn half_ring_jump_is_ignored() {
        let mut pins = ScriptedPins::positions(&[0, 8, 8]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert_eq!(emitter.previous(), pos(8));
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn multi_detent_jump_sends_a_single_press() {
        let mut pins = ScriptedPins::positions(&[2, 5, 5]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        assert_eq!(
            emitter.tick(&mut pins, &mut transport),
            Ok(TickOutcome::Pressed(Step::Clockwise))
        );
        assert_eq!(emitter.last_delta(), 3);
        emitter.tick(&mut pins, &mut transport).unwrap();
        assert_eq!(reports(&transport), [cw(), KeyboardReport::release()]);
    }

    #[test]
    fn raw_code_scenario() {
        // Raw codes 0, 1, 1: positions 10, 11, 11.
        let mut pins = ScriptedPins::new(&[0b0000, 0b0001, 0b0001, 0b0001]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();
        assert_eq!(emitter.previous(), pos(10));

        assert_eq!(
            emitter.tick(&mut pins, &mut transport),
            Ok(TickOutcome::Pressed(Step::Clockwise))
        );
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Released));
        assert_eq!(emitter.previous(), pos(11));
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Idle));
        assert_eq!(transport.sent.len(), 2);
    }

    // ── Transport readiness ──────────────────────────────────────────

    #[test]
    fn never_ready_transport_sends_nothing() {
        let mut pins = ScriptedPins::positions(&[0, 1, 2, 3, 4]);
        let mut transport = RecordingTransport {
            not_ready: true,
            ..Default::default()
        };
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        for _ in 0..10 {
            assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::NotReady));
        }
        assert!(transport.sent.is_empty());
        assert_eq!(emitter.state(), EmitterState::Idle);
        assert_eq!(emitter.previous(), pos(0));
        assert_eq!(pins.reads, 1);
    }

    #[test]
    fn pending_release_waits_for_readiness() {
        let mut pins = ScriptedPins::positions(&[0, 1, 1]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        emitter.tick(&mut pins, &mut transport).unwrap();

        transport.not_ready = true;
        for _ in 0..5 {
            assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::NotReady));
        }
        assert_eq!(emitter.state(), EmitterState::KeyDownPendingRelease);

        transport.not_ready = false;
        assert_eq!(emitter.tick(&mut pins, &mut transport), Ok(TickOutcome::Released));
        assert_eq!(reports(&transport), [cw(), KeyboardReport::release()]);
    }

    #[test]
    fn step_made_while_not_ready_fires_once_ready() {
        let mut pins = ScriptedPins::positions(&[0, 1, 1]);
        let mut transport = RecordingTransport {
            not_ready: true,
            ..Default::default()
        };
        let mut emitter = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();

        emitter.tick(&mut pins, &mut transport).unwrap();
        transport.not_ready = false;
        assert_eq!(
            emitter.tick(&mut pins, &mut transport),
            Ok(TickOutcome::Pressed(Step::Clockwise))
        );
    }

    // ── Configuration ────────────────────────────────────────────────

    #[test]
    fn custom_bindings_and_report_id() {
        let config = KnobConfig {
            report_id: 1,
            clockwise: KeyBinding {
                modifier: 0x01,
                keycode: 0x52,
            },
            ..Default::default()
        };
        let mut pins = ScriptedPins::positions(&[7, 8, 8]);
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::start(&mut pins, config).unwrap();

        emitter.tick(&mut pins, &mut transport).unwrap();
        emitter.tick(&mut pins, &mut transport).unwrap();

        assert_eq!(transport.sent[0].0, 1);
        assert_eq!(transport.sent[0].1.modifier, 0x01);
        assert_eq!(transport.sent[0].1.keycodes[0], 0x52);
        assert_eq!(transport.sent[1], (1, KeyboardReport::release()));
    }

    #[test]
    fn remote_wakeup_only_when_enabled_and_suspended() {
        let mut pins = ScriptedPins::positions(&[0]);
        let mut transport = RecordingTransport {
            suspended: true,
            not_ready: true,
            ..Default::default()
        };

        let mut quiet = ReportEmitter::start(&mut pins, KnobConfig::default()).unwrap();
        quiet.tick(&mut pins, &mut transport).unwrap();
        assert_eq!(transport.wakeups, 0);

        let config = KnobConfig {
            wake_host_on_suspend: true,
            ..Default::default()
        };
        let mut waking = ReportEmitter::start(&mut pins, config).unwrap();
        waking.tick(&mut pins, &mut transport).unwrap();
        assert_eq!(transport.wakeups, 1);

        transport.suspended = false;
        waking.tick(&mut pins, &mut transport).unwrap();
        assert_eq!(transport.wakeups, 1);
    }

    // ── Errors ───────────────────────────────────────────────────────

    #[test]
    fn pin_error_leaves_state_untouched() {
        let mut transport = RecordingTransport::default();
        let mut emitter = ReportEmitter::new(pos(4), KnobConfig::default());

        assert_eq!(
            emitter.tick(&mut FailingPins, &mut transport),
            Err("pin read failed")
        );
        assert_eq!(emitter.previous(), pos(4));
        assert_eq!(emitter.state(), EmitterState::Idle);
        assert!(transport.sent.is_empty());
    }
}
