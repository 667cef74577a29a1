use crate::common::{Int, NonZeroUInt, UInt};
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};

/// A source of uniformly distributed integers.
pub trait Roller {
    /// Returns a value in `[min, max]`. `min >= max` yields `min`.
    fn uniform_int(&mut self, min: Int, max: Int) -> Int;

    fn roll(&mut self, faces: NonZeroUInt) -> UInt {
        self.uniform_int(1, faces.get().into()) as UInt
    }
}

impl<R: Rng> Roller for R {
    fn uniform_int(&mut self, min: Int, max: Int) -> Int {
        if min >= max {
            min
        } else {
            self.gen_range(min..=max)
        }
    }
}

/// Replays a fixed sequence of values, cycling when exhausted. Values outside
/// the requested range wrap into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRoller {
    values: Vec<Int>,
    index: usize,
}

impl SequenceRoller {
    pub fn new(values: impl IntoIterator<Item = Int>) -> Self {
        Self {
            values: values.into_iter().collect(),
            index: 0,
        }
    }

    /// Number of values handed out so far.
    pub fn drawn(&self) -> usize {
        self.index
    }
}

impl Roller for SequenceRoller {
    fn uniform_int(&mut self, min: Int, max: Int) -> Int {
        if self.values.is_empty() || min >= max {
            return min;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        if (min..=max).contains(&value) {
            value
        } else {
            min + (value - min).rem_euclid(max - min + 1)
        }
    }
}

/// A roller shared between threads; each draw locks the inner roller.
#[derive(Debug, Default)]
pub struct SharedRoller<R>(Arc<Mutex<R>>);

impl<R> SharedRoller<R> {
    pub fn new(roller: R) -> Self {
        Self(Arc::new(Mutex::new(roller)))
    }
}

impl<R> Clone for SharedRoller<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R: Roller> Roller for SharedRoller<R> {
    fn uniform_int(&mut self, min: Int, max: Int) -> Int {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .uniform_int(min, max)
    }
}

#[cfg(test)]
pub(crate) use step::StepRoller;


#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sequence_roller() {
        let mut roller = SequenceRoller::new([3, 5, 9]);
        let d6 = NonZeroUInt::new(6).unwrap();
        assert_eq!(roller.roll(d6), 3);
        assert_eq!(roller.roll(d6), 5);
        assert_eq!(roller.roll(d6), 3);
        assert_eq!(roller.roll(d6), 3);
        assert_eq!(roller.drawn(), 4);
        assert_eq!(roller.uniform_int(0, 0), 0);
    }

    #[test]
    fn test_rng_roller_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let x = rng.uniform_int(2, 5);
            assert!((2..=5).contains(&x));
        }
        assert_eq!(rng.uniform_int(4, 4), 4);
    }

    #[test]
    fn test_shared_roller_threads() {
        let shared = SharedRoller::new(StdRng::seed_from_u64(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut roller = shared.clone();
                std::thread::spawn(move || {
                    (0..50).all(|_| (1..=20).contains(&roller.uniform_int(1, 20)))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
