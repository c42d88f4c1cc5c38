//! Breakpoint search: walks from the lower sample towards the upper bound,
//! aiming each step at a file size one `step` above the previous one.
//!
//! Every checkpoint runs a small state machine:
//!
//! ```text
//! Advancing -> Probing -> Accepted
//!                 |  ^
//!                 v  |
//!            Recalibrating -> Punting -> Accepted
//! ```
//!
//! Probing asks the oracle for the real size at the current guess. A miss
//! rescales the growth factor by `observed / target` and probes again. A
//! miss that repeats, a factor that stops changing, a guess that stops
//! moving or an exhausted attempt budget all punt: the latest sample is
//! accepted as-is so the run always makes progress.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::oracle::ResizeOracle;
use crate::types::{Dimensions, GrowthFactor, Sample};
use std::collections::HashSet;
use std::fmt;
use std::iter::FusedIterator;

/// Why an out-of-tolerance sample was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuntReason {
    /// The same miss came back and it is smaller than one step.
    RepeatedDelta,
    /// The same miss came back twice and it is at least one step.
    Diverging,
    /// Recalibration floored a moving axis to zero.
    FactorCollapsed,
    /// Recalibration left the growth factor unchanged.
    FixedPoint,
    /// Recalibration produced the guess that was just probed.
    GuessRepeated,
    /// The per-checkpoint attempt budget ran out.
    AttemptsExhausted,
    /// The oracle timed out after an earlier probe of this checkpoint.
    ProbeTimedOut,
}

impl fmt::Display for PuntReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            PuntReason::RepeatedDelta => "repeated delta within one step",
            PuntReason::Diverging => "repeated delta beyond one step",
            PuntReason::FactorCollapsed => "growth factor collapsed",
            PuntReason::FixedPoint => "growth factor stopped changing",
            PuntReason::GuessRepeated => "guess stopped moving",
            PuntReason::AttemptsExhausted => "attempt limit reached",
            PuntReason::ProbeTimedOut => "probe timed out",
        };
        f.write_str(reason)
    }
}

/// How a breakpoint was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The lower-bound sample the search started from.
    Seed,
    /// Within the tolerance floor of its checkpoint.
    Converged,
    Punted(PuntReason),
}

/// An accepted sample bound to its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    index: usize,
    target_size: u64,
    sample: Sample,
    outcome: Outcome,
}

impl Breakpoint {
    /// Position in the stream; the seed is `0`.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The checkpoint file size this breakpoint was aiming for.
    pub fn target_size(&self) -> u64 {
        self.target_size
    }

    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    pub fn dimensions(&self) -> Dimensions {
        self.sample.dimensions()
    }

    pub fn file_size(&self) -> u64 {
        self.sample.file_size()
    }

    /// Absolute distance between the actual and the targeted size.
    pub fn delta(&self) -> u64 {
        self.sample.file_size().abs_diff(self.target_size)
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_punted(&self) -> bool {
        matches!(self.outcome, Outcome::Punted(_))
    }
}

/// Progress notifications emitted while the search runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Seeded {
        lower: Dimensions,
        upper: Dimensions,
        factor: GrowthFactor,
    },
    Probing {
        checkpoint: usize,
        guess: Dimensions,
        target_size: u64,
    },
    Calibrating {
        checkpoint: usize,
        delta: u64,
        adjustment: f64,
    },
    TimedOut {
        checkpoint: usize,
        guess: Dimensions,
        attempt: usize,
    },
    Punting {
        checkpoint: usize,
        delta: u64,
        reason: PuntReason,
    },
    Accepted {
        checkpoint: usize,
        dimensions: Dimensions,
        file_size: u64,
        target_size: u64,
    },
    Finished {
        breakpoints: usize,
    },
}

/// Receives [`SearchEvent`]s; the search never depends on what it does.
pub trait SearchObserver {
    fn observe(&mut self, event: &SearchEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SearchObserver for Silent {
    fn observe(&mut self, _event: &SearchEvent) {}
}

impl<T: SearchObserver + ?Sized> SearchObserver for &mut T {
    fn observe(&mut self, event: &SearchEvent) {
        (**self).observe(event);
    }
}

struct SearchState {
    /// Actual dimensions of the last accepted sample.
    start: Dimensions,
    /// Dimensions last requested from the oracle.
    last_request: Dimensions,
    target_size: u64,
    factor: GrowthFactor,
    seen_deltas: HashSet<u64>,
}

enum Phase {
    Seed(Sample),
    Advancing,
    Done,
}

enum Step {
    Probe,
    Recalibrate { sample: Sample, delta: u64 },
    Punt(Sample, PuntReason),
    Accept(Sample),
}

/// Lazy stream of breakpoints between a lower sample and an upper bound.
///
/// Yields the lower sample first, then one breakpoint per checkpoint until the
/// requested dimensions reach the upper bound. After an error the stream ends.
pub struct BreakpointSearch<O, Obs = Silent> {
    oracle: O,
    observer: Obs,
    config: SearchConfig,
    lower: Dimensions,
    upper: Dimensions,
    state: SearchState,
    phase: Phase,
    emitted: usize,
}

impl<O: ResizeOracle> BreakpointSearch<O, Silent> {
    /// Seeds the search from the lower and upper oracle samples.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BreakpointError::DivergentSamples`] when the upper
    /// sample is not larger in bytes than the lower one and there is room to
    /// grow between them.
    pub fn new(oracle: O, lower: Sample, upper: &Sample, config: SearchConfig) -> Result<Self> {
        let factor = seed_growth_factor(&lower, upper, config.step())?;
        Ok(Self::with_growth_factor(
            oracle,
            lower,
            upper.dimensions(),
            factor,
            config,
        ))
    }

    /// Seeds the search with a known growth factor.
    pub fn with_growth_factor(
        oracle: O,
        lower: Sample,
        upper: Dimensions,
        factor: GrowthFactor,
        config: SearchConfig,
    ) -> Self {
        let lower_bound = lower.dimensions();
        let upper = Dimensions::new(
            upper.width.max(lower_bound.width),
            upper.height.max(lower_bound.height),
        );

        Self {
            oracle,
            observer: Silent,
            config,
            lower: lower_bound,
            upper,
            state: SearchState {
                start: lower_bound,
                last_request: lower_bound,
                target_size: lower.file_size(),
                factor,
                seen_deltas: HashSet::new(),
            },
            phase: Phase::Seed(lower),
            emitted: 0,
        }
    }
}

impl<O, Obs> BreakpointSearch<O, Obs> {
    /// Replaces the observer.
    pub fn with_observer<N: SearchObserver>(self, observer: N) -> BreakpointSearch<O, N> {
        BreakpointSearch {
            oracle: self.oracle,
            observer,
            config: self.config,
            lower: self.lower,
            upper: self.upper,
            state: self.state,
            phase: self.phase,
            emitted: self.emitted,
        }
    }

    pub fn growth_factor(&self) -> GrowthFactor {
        self.state.factor
    }

    pub fn lower_bound(&self) -> Dimensions {
        self.lower
    }

    pub fn upper_bound(&self) -> Dimensions {
        self.upper
    }

    /// Next guess from the current start. Each axis below the upper bound moves
    /// at least one pixel past the previous request.
    fn advance(&self, factor: GrowthFactor) -> Dimensions {
        let state = &self.state;
        Dimensions::new(
            step_axis(
                state.start.width,
                factor.width,
                state.last_request.width,
                self.lower.width,
                self.upper.width,
            ),
            step_axis(
                state.start.height,
                factor.height,
                state.last_request.height,
                self.lower.height,
                self.upper.height,
            ),
        )
    }

    fn reached_upper(&self) -> bool {
        self.state.last_request.covers(self.upper) || self.state.start.covers(self.upper)
    }
}

/// Growth factor a search seeded from `lower` and `upper` starts with.
///
/// # Arguments
/// * `lower` - Sample rendered at the lower bound
/// * `upper` - Sample rendered at the upper bound
/// * `step` - File-size increase between breakpoints, in bytes
///
/// # Returns
/// * The default (zero) factor when `lower` already covers `upper`, since such a
///   search only yields its seed
/// * The estimated factor otherwise, or `DivergentSamples` if `upper` is not larger
pub fn seed_growth_factor(lower: &Sample, upper: &Sample, step: u64) -> Result<GrowthFactor> {
    if lower.dimensions().covers(upper.dimensions()) {
        return Ok(GrowthFactor::default());
    }
    GrowthFactor::estimate(lower, upper, step)
}

fn step_axis(start: u32, delta: u32, previous: u32, lower: u32, upper: u32) -> u32 {
    let mut next = start.saturating_add(delta);
    if next <= previous && previous < upper {
        next = previous + 1;
    }
    next.max(lower).min(upper)
}

impl<O: ResizeOracle, Obs: SearchObserver> BreakpointSearch<O, Obs> {
    fn emit_seed(&mut self, sample: Sample) -> Breakpoint {
        self.observer.observe(&SearchEvent::Seeded {
            lower: self.lower,
            upper: self.upper,
            factor: self.state.factor,
        });
        self.observer.observe(&SearchEvent::Accepted {
            checkpoint: 0,
            dimensions: sample.dimensions(),
            file_size: sample.file_size(),
            target_size: self.state.target_size,
        });
        self.emitted = 1;

        Breakpoint {
            index: 0,
            target_size: self.state.target_size,
            sample,
            outcome: Outcome::Seed,
        }
    }

    fn run_checkpoint(&mut self) -> Result<Breakpoint> {
        let checkpoint = self.emitted;
        let step = self.config.step();
        let target = self.state.target_size.saturating_add(step);
        self.state.seen_deltas.clear();

        let mut factor = self.state.factor;
        let mut guess = self.advance(factor);
        let mut attempts = 0usize;
        let mut retried_wide_miss = false;
        let mut latest: Option<Sample> = None;
        let mut next = Step::Probe;

        let (sample, outcome) = loop {
            next = match next {
                Step::Probe => {
                    self.observer.observe(&SearchEvent::Probing {
                        checkpoint,
                        guess,
                        target_size: target,
                    });

                    match self.oracle.resize(guess) {
                        Ok(sample) => {
                            let delta = sample.file_size().abs_diff(target);
                            if delta <= self.config.tolerance_floor() {
                                Step::Accept(sample)
                            } else if !self.state.seen_deltas.contains(&delta) {
                                Step::Recalibrate { sample, delta }
                            } else if delta < step {
                                Step::Punt(sample, PuntReason::RepeatedDelta)
                            } else if !retried_wide_miss {
                                retried_wide_miss = true;
                                Step::Recalibrate { sample, delta }
                            } else {
                                Step::Punt(sample, PuntReason::Diverging)
                            }
                        }
                        Err(err) if err.is_timeout() => {
                            attempts += 1;
                            self.observer.observe(&SearchEvent::TimedOut {
                                checkpoint,
                                guess,
                                attempt: attempts,
                            });
                            match latest.take() {
                                Some(sample) => Step::Punt(sample, PuntReason::ProbeTimedOut),
                                None if attempts < self.config.max_attempts() => Step::Probe,
                                None => return Err(err.into()),
                            }
                        }
                        Err(err) => return Err(err.into()),
                    }
                }

                Step::Recalibrate { sample, delta } => {
                    if attempts >= self.config.max_attempts() {
                        Step::Punt(sample, PuntReason::AttemptsExhausted)
                    } else {
                        attempts += 1;
                        let adjustment = sample.file_size() as f64 / target as f64;
                        self.state.seen_deltas.insert(delta);
                        self.observer.observe(&SearchEvent::Calibrating {
                            checkpoint,
                            delta,
                            adjustment,
                        });

                        match factor.rescale(adjustment) {
                            None => Step::Punt(sample, PuntReason::FactorCollapsed),
                            Some(rescaled) if rescaled.collapsed_from(factor) => {
                                Step::Punt(sample, PuntReason::FactorCollapsed)
                            }
                            Some(rescaled) if rescaled == factor => {
                                Step::Punt(sample, PuntReason::FixedPoint)
                            }
                            Some(rescaled) => {
                                factor = rescaled;
                                let retry = self.advance(factor);
                                if retry == guess {
                                    Step::Punt(sample, PuntReason::GuessRepeated)
                                } else {
                                    guess = retry;
                                    latest = Some(sample);
                                    Step::Probe
                                }
                            }
                        }
                    }
                }

                Step::Punt(sample, reason) => {
                    self.observer.observe(&SearchEvent::Punting {
                        checkpoint,
                        delta: sample.file_size().abs_diff(target),
                        reason,
                    });
                    break (sample, Outcome::Punted(reason));
                }

                Step::Accept(sample) => break (sample, Outcome::Converged),
            };
        };

        self.observer.observe(&SearchEvent::Accepted {
            checkpoint,
            dimensions: sample.dimensions(),
            file_size: sample.file_size(),
            target_size: target,
        });

        let state = &mut self.state;
        state.start = sample.dimensions();
        state.last_request = guess;
        state.target_size = target;
        state.factor = factor;
        state.seen_deltas.clear();
        self.emitted += 1;

        Ok(Breakpoint {
            index: checkpoint,
            target_size: target,
            sample,
            outcome,
        })
    }
}

impl<O: ResizeOracle, Obs: SearchObserver> Iterator for BreakpointSearch<O, Obs> {
    type Item = Result<Breakpoint>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Seed(sample) => {
                self.phase = Phase::Advancing;
                Some(Ok(self.emit_seed(sample)))
            }
            Phase::Advancing => {
                if self.reached_upper() {
                    self.observer.observe(&SearchEvent::Finished {
                        breakpoints: self.emitted,
                    });
                    return None;
                }
                match self.run_checkpoint() {
                    Ok(breakpoint) => {
                        self.phase = Phase::Advancing;
                        Some(Ok(breakpoint))
                    }
                    Err(err) => Some(Err(err)),
                }
            }
            Phase::Done => None,
        }
    }
}

impl<O: ResizeOracle, Obs: SearchObserver> FusedIterator for BreakpointSearch<O, Obs> {}
