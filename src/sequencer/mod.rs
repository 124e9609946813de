//! Trial sequencing: which interval carries the odd tone, and which stimuli
//! make up each three-interval trial.
//!
//! The main run uses a balanced order fixed up front and shuffled once; the
//! practice run draws each trial independently. Randomness comes from the
//! caller's `Rng` so tests can pass a seeded `StdRng`.

use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// One of the two intervals that can carry the odd stimulus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
    First,
    Third,
}

impl Interval {
    /// Interval number as presented to the subject (1 or 3)
    pub fn number(self) -> u8 {
        match self {
            Interval::First => 1,
            Interval::Third => 3,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Interval::First),
            3 => Some(Interval::Third),
            _ => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Index of a stimulus file; 1 is the base tone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StimulusId(pub u32);

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration of one trial
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialPlan {
    pub odd_position: Interval,
    pub odd_step: u32,
    pub base_step: u32,
}

impl TrialPlan {
    /// The three stimuli in presentation order
    pub fn stimuli(&self) -> [StimulusId; 3] {
        let odd = StimulusId(self.odd_step);
        let base = StimulusId(self.base_step);
        match self.odd_position {
            Interval::First => [odd, base, base],
            Interval::Third => [base, base, odd],
        }
    }
}

/// Balanced interval order: floor(n/2) odd-at-3rd followed by the rest
/// odd-at-1st, before shuffling
pub fn balanced_order(max_trials: u32) -> Vec<Interval> {
    let half = (max_trials / 2) as usize;
    let mut order = vec![Interval::Third; half];
    order.resize(max_trials as usize, Interval::First);
    order
}

/// Builds trial plans for the practice and main runs
pub struct TrialSequencer<R: Rng = StdRng> {
    rng: R,
    base_step: u32,
    num_steps: u32,
    main_order: Vec<Interval>,
}

impl TrialSequencer<StdRng> {
    /// Seeded sequencer, or entropy-seeded when `seed` is None
    pub fn from_seed(seed: Option<u64>, base_step: u32, num_steps: u32) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, base_step, num_steps)
    }
}

impl<R: Rng> TrialSequencer<R> {
    pub fn with_rng(rng: R, base_step: u32, num_steps: u32) -> Self {
        TrialSequencer {
            rng,
            base_step,
            num_steps,
            main_order: Vec::new(),
        }
    }

    /// Fisher-Yates shuffle of the balanced order; replaces any previous order
    pub fn prepare_main_run(&mut self, max_trials: u32) -> &[Interval] {
        let mut order = balanced_order(max_trials);
        order.shuffle(&mut self.rng);
        self.main_order = order;
        &self.main_order
    }

    pub fn main_order(&self) -> &[Interval] {
        &self.main_order
    }

    /// Plan for main-run trial `index` (0-based) at the staircase's step
    pub fn main_trial(&self, index: u32, step: u32) -> Option<TrialPlan> {
        self.main_order.get(index as usize).map(|&odd_position| TrialPlan {
            odd_position,
            odd_step: step,
            base_step: self.base_step,
        })
    }

    /// Independent 50/50 draw using the two most distant stimuli
    pub fn practice_trial(&mut self) -> TrialPlan {
        let odd_position = if self.rng.gen_bool(0.5) {
            Interval::Third
        } else {
            Interval::First
        };
        TrialPlan {
            odd_position,
            odd_step: self.practice_odd_step(),
            base_step: self.base_step,
        }
    }

    fn practice_odd_step(&self) -> u32 {
        // farthest end of the stimulus range from the base tone
        if self.base_step.saturating_sub(1) > self.num_steps.saturating_sub(self.base_step) {
            1
        } else {
            self.num_steps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn count(order: &[Interval], pos: Interval) -> usize {
        order.iter().filter(|&&p| p == pos).count()
    }

    #[test]
    fn test_balanced_order_odd_length() {
        let order = balanced_order(75);
        assert_eq!(order.len(), 75);
        assert_eq!(count(&order, Interval::Third), 37);
        assert_eq!(count(&order, Interval::First), 38);
        assert_eq!(order[0], Interval::Third);
        assert_eq!(order[74], Interval::First);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a = TrialSequencer::from_seed(Some(7), 1, 101);
        let mut b = TrialSequencer::from_seed(Some(7), 1, 101);
        assert_eq!(a.prepare_main_run(40).to_vec(), b.prepare_main_run(40).to_vec());
    }

    #[test]
    fn test_main_trial_uses_order_and_step() {
        let mut seq = TrialSequencer::from_seed(Some(3), 1, 101);
        seq.prepare_main_run(10);
        let expected = seq.main_order()[4];
        let plan = seq.main_trial(4, 23).unwrap();
        assert_eq!(plan.odd_position, expected);
        assert_eq!(plan.odd_step, 23);
        assert_eq!(plan.base_step, 1);
        assert!(seq.main_trial(10, 23).is_none());
    }

    #[test]
    fn test_stimuli_order() {
        let plan = TrialPlan {
            odd_position: Interval::Third,
            odd_step: 40,
            base_step: 1,
        };
        assert_eq!(plan.stimuli(), [StimulusId(1), StimulusId(1), StimulusId(40)]);

        let plan = TrialPlan {
            odd_position: Interval::First,
            ..plan
        };
        assert_eq!(plan.stimuli(), [StimulusId(40), StimulusId(1), StimulusId(1)]);
    }

    #[test]
    fn test_practice_uses_extreme_steps() {
        let mut seq = TrialSequencer::from_seed(Some(11), 1, 101);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let plan = seq.practice_trial();
            assert_eq!(plan.odd_step, 101);
            assert_eq!(plan.base_step, 1);
            seen.insert(plan.odd_position);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_interval_numbers() {
        assert_eq!(Interval::from_number(1), Some(Interval::First));
        assert_eq!(Interval::from_number(3), Some(Interval::Third));
        assert_eq!(Interval::from_number(2), None);
        assert_eq!(Interval::Third.to_string(), "3");
    }

    proptest! {
        #[test]
        fn prop_shuffled_order_stays_balanced(max_trials in 0u32..300, seed in any::<u64>()) {
            let mut seq = TrialSequencer::from_seed(Some(seed), 1, 101);
            let order = seq.prepare_main_run(max_trials).to_vec();
            prop_assert_eq!(order.len(), max_trials as usize);
            prop_assert_eq!(count(&order, Interval::Third), (max_trials / 2) as usize);
            prop_assert_eq!(
                count(&order, Interval::First),
                (max_trials - max_trials / 2) as usize
            );
        }
    }
}
