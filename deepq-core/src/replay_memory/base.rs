use super::ReplayMemoryConfig;
use crate::{error::DqnError, transition::Transition, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use rand::{seq::index, Rng};
use std::collections::{vec_deque::Iter, VecDeque};

/// Replay memory holding at most `capacity` transitions.
///
/// Pushing into a full memory evicts the oldest transition. Batches are sampled
/// uniformly without replacement.
#[derive(Debug, Clone)]
pub struct ReplayMemory {
    capacity: usize,
    transitions: VecDeque<Transition>,
}

impl ReplayMemory {
    /// Returns the maximum number of transitions kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the stored transitions, oldest first.
    pub fn iter(&self) -> Iter<'_, Transition> {
        self.transitions.iter()
    }
}

impl ExperienceBufferBase for ReplayMemory {
    type Item = Transition;

    fn push(&mut self, tr: Transition) {
        self.transitions.push_back(tr);
        while self.transitions.len() > self.capacity {
            self.transitions.pop_front();
        }
    }

    fn len(&self) -> usize {
        self.transitions.len()
    }
}

impl ReplayBufferBase for ReplayMemory {
    type Config = ReplayMemoryConfig;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(
                DqnError::InvalidConfig("replay memory capacity must be positive".into()).into(),
            );
        }
        Ok(Self {
            capacity: config.capacity,
            // Large memories grow on demand rather than reserving everything up front.
            transitions: VecDeque::with_capacity(config.capacity.min(1 << 16)),
        })
    }

    fn batch<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if size > self.len() {
            return Err(DqnError::InsufficientMemory {
                required: size,
                available: self.len(),
            }
            .into());
        }
        Ok(index::sample(rng, self.len(), size)
            .into_iter()
            .map(|ix| &self.transitions[ix])
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Action, Frame, Outcome, StackedInput};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn transition(reward: f32) -> Transition {
        let state = StackedInput::repeat(Frame::from_vec(1, 1, vec![0]).unwrap());
        Transition::new(state, Action(0), reward, Outcome::Terminal).unwrap()
    }

    fn rewards(memory: &ReplayMemory) -> Vec<f32> {
        memory.iter().map(|tr| tr.reward()).collect()
    }

    fn build(capacity: usize) -> ReplayMemory {
        ReplayMemory::build(&ReplayMemoryConfig::default().capacity(capacity)).unwrap()
    }

    #[test]
    fn test_capacity_two_keeps_last_two() {
        let mut memory = build(2);
        for r in [1.0, 2.0, 3.0] {
            memory.push(transition(r));
        }
        assert_eq!(memory.len(), 2);
        assert_eq!(rewards(&memory), vec![2.0, 3.0]);
    }

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let capacity = 7;
        let mut memory = build(capacity);
        for i in 0..50 {
            memory.push(transition(i as f32));
            assert!(memory.len() <= capacity);
        }
        let expected: Vec<f32> = (43..50).map(|i| i as f32).collect();
        assert_eq!(rewards(&memory), expected);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = ReplayMemory::build(&ReplayMemoryConfig::default().capacity(0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DqnError>(),
            Some(DqnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_batch_without_replacement() {
        let mut memory = build(10);
        for i in 0..10 {
            memory.push(transition(i as f32));
        }
        let mut rng = StdRng::seed_from_u64(0);
        let batch = memory.batch(10, &mut rng).unwrap();
        let distinct: HashSet<u32> = batch.iter().map(|tr| tr.reward() as u32).collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn test_batch_larger_than_memory() {
        let mut memory = build(10);
        memory.push(transition(0.0));
        let mut rng = StdRng::seed_from_u64(0);
        let err = memory.batch(2, &mut rng).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DqnError>(),
            Some(&DqnError::InsufficientMemory {
                required: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_batch_is_reproducible_from_seed() {
        let mut memory = build(100);
        for i in 0..100 {
            memory.push(transition(i as f32));
        }
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            memory
                .batch(16, &mut rng)
                .unwrap()
                .iter()
                .map(|tr| tr.reward())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }
}
