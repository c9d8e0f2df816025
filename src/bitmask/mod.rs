//! Fixed-capacity bit vector over a dense index space.
//!
//! One bit per element, packed into 32-bit words. The same mask is
//! touched from exclusive host code and from concurrent kernel tasks, so
//! every bit operation comes in a plain and an atomic flavor: plain
//! accesses are only legal when exclusivity is otherwise guaranteed (one
//! task per index), atomic accesses whenever several tasks may address
//! the same bit, e.g. faces marking their shared edges.

use std::sync::atomic::{AtomicU32, Ordering};

const BITS_PER_WORD: usize = 32;

/// Bit vector of a fixed logical size.
///
/// Bits at indices `>= size()` inside the last word are padding and
/// never meaningful. Indexing a bit `>= size()` is a contract violation
/// and asserts.
pub struct Bitmask {
    size: usize,
    words: Vec<AtomicU32>,
}

impl Bitmask {
    /// An all-zero mask of `size` bits.
    pub fn new(size: usize) -> Self {
        let num_words = (size + BITS_PER_WORD - 1) / BITS_PER_WORD;
        let words = (0..num_words).map(|_| AtomicU32::new(0)).collect();
        Self { size, words }
    }

    /// Backing storage bytes needed for a mask of `size` bits.
    pub fn num_bytes(size: usize) -> usize {
        ((size + BITS_PER_WORD - 1) / BITS_PER_WORD) * 4
    }

    /// Logical size in bits.
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn locate(&self, bit: usize) -> (usize, u32) {
        assert!(bit < self.size, "bit index {} out of range {}", bit, self.size);
        (bit / BITS_PER_WORD, 1u32 << (bit % BITS_PER_WORD))
    }

    /// Set one bit. `atomic` must be true whenever another task may
    /// touch the same word concurrently.
    #[inline]
    pub fn set(&self, bit: usize, atomic: bool) {
        let (word, mask) = self.locate(bit);
        if atomic {
            self.words[word].fetch_or(mask, Ordering::Relaxed);
        } else {
            let current = self.words[word].load(Ordering::Relaxed);
            self.words[word].store(current | mask, Ordering::Relaxed);
        }
    }

    /// Clear one bit.
    #[inline]
    pub fn reset(&self, bit: usize, atomic: bool) {
        let (word, mask) = self.locate(bit);
        if atomic {
            self.words[word].fetch_and(!mask, Ordering::Relaxed);
        } else {
            let current = self.words[word].load(Ordering::Relaxed);
            self.words[word].store(current & !mask, Ordering::Relaxed);
        }
    }

    /// Flip one bit.
    #[inline]
    pub fn flip(&self, bit: usize, atomic: bool) {
        let (word, mask) = self.locate(bit);
        if atomic {
            self.words[word].fetch_xor(mask, Ordering::Relaxed);
        } else {
            let current = self.words[word].load(Ordering::Relaxed);
            self.words[word].store(current ^ mask, Ordering::Relaxed);
        }
    }

    /// Test one bit.
    #[inline]
    pub fn test(&self, bit: usize) -> bool {
        let (word, mask) = self.locate(bit);
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    /// Clear the whole mask from exclusive host code.
    pub fn reset_all(&mut self) {
        for word in &mut self.words {
            *word.get_mut() = 0;
        }
    }

    /// Set the whole mask from exclusive host code.
    pub fn set_all(&mut self) {
        for word in &mut self.words {
            *word.get_mut() = u32::MAX;
        }
    }

    /// Cooperative clear: participant `worker` of `stride` total clears
    /// words `worker, worker + stride, ...`. All participants must cross
    /// a barrier before any of them reads the mask again.
    pub fn reset_strided(&self, worker: usize, stride: usize) {
        let mut word = worker;
        while word < self.words.len() {
            self.words[word].store(0, Ordering::Relaxed);
            word += stride;
        }
    }

    /// Cooperative set, same contract as [`reset_strided`](Self::reset_strided).
    pub fn set_strided(&self, worker: usize, stride: usize) {
        let mut word = worker;
        while word < self.words.len() {
            self.words[word].store(u32::MAX, Ordering::Relaxed);
            word += stride;
        }
    }

    /// Current value of one backing word.
    #[inline]
    pub fn word(&self, index: usize) -> u32 {
        self.words[index].load(Ordering::Relaxed)
    }

    /// Number of backing words.
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Population count over the first `upto` bits.
    pub fn count_set(&self, upto: usize) -> u32 {
        assert!(upto <= self.size, "count range {} exceeds size {}", upto, self.size);
        let full_words = upto / BITS_PER_WORD;
        let mut count = 0u32;
        for word in 0..full_words {
            count += self.word(word).count_ones();
        }
        let tail = upto % BITS_PER_WORD;
        if tail != 0 {
            count += (self.word(full_words) & ((1u32 << tail) - 1)).count_ones();
        }
        count
    }

    /// Snapshot of the backing words, for bulk transfer to a host mirror.
    pub fn as_words(&self) -> Vec<u32> {
        self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect()
    }

    /// Overwrite the backing words from a host mirror.
    pub fn copy_from_words(&mut self, words: &[u32]) {
        assert_eq!(words.len(), self.words.len(), "word count mismatch");
        for (dst, src) in self.words.iter_mut().zip(words) {
            *dst.get_mut() = *src;
        }
    }

    /// A larger mask carrying over every bit of this one. Capacities only
    /// grow, so `new_size >= size()`.
    pub fn resized(&self, new_size: usize) -> Bitmask {
        assert!(new_size >= self.size, "bitmask capacity never shrinks");
        let mut grown = Bitmask::new(new_size);
        for (word, value) in self.as_words().into_iter().enumerate() {
            *grown.words[word].get_mut() = value;
        }
        grown
    }
}

impl Clone for Bitmask {
    fn clone(&self) -> Self {
        let words = self
            .words
            .iter()
            .map(|w| AtomicU32::new(w.load(Ordering::Relaxed)))
            .collect();
        Self { size: self.size, words }
    }
}

impl std::fmt::Debug for Bitmask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmask(size={}, set={})", self.size, self.count_set(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::Barrier;

    #[test]
    fn set_test_reset_round_trip() {
        let sizes = [1usize, 31, 32, 33, 64, 100, 1000];
        for &size in &sizes {
            let mask = Bitmask::new(size);
            for bit in 0..size {
                mask.set(bit, false);
                assert!(mask.test(bit), "size {} bit {}", size, bit);
                mask.reset(bit, false);
                assert!(!mask.test(bit), "size {} bit {}", size, bit);
            }
        }
    }

    #[test]
    fn random_sequence_matches_reference() {
        let mut rng = rand::thread_rng();
        let size = 257;
        let mask = Bitmask::new(size);
        let mut reference = vec![false; size];
        for _ in 0..5000 {
            let bit = rng.gen_range(0..size);
            match rng.gen_range(0..3) {
                0 => {
                    mask.set(bit, rng.gen());
                    reference[bit] = true;
                }
                1 => {
                    mask.reset(bit, rng.gen());
                    reference[bit] = false;
                }
                _ => {
                    mask.flip(bit, rng.gen());
                    reference[bit] = !reference[bit];
                }
            }
        }
        for bit in 0..size {
            assert_eq!(mask.test(bit), reference[bit], "bit {}", bit);
        }
        let expected = reference.iter().filter(|&&b| b).count() as u32;
        assert_eq!(mask.count_set(size), expected);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_bounds_bit_is_a_contract_violation() {
        let mask = Bitmask::new(40);
        mask.set(40, false);
    }

    #[test]
    fn atomic_set_from_many_threads_loses_nothing() {
        let mask = Bitmask::new(1024);
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let mask = &mask;
                scope.spawn(move || {
                    for bit in (worker..1024).step_by(8) {
                        mask.set(bit, true);
                    }
                });
            }
        });
        assert_eq!(mask.count_set(1024), 1024);
    }

    #[test]
    fn strided_reset_covers_every_word() {
        let mut mask = Bitmask::new(300);
        mask.set_all();
        let workers = 4;
        let barrier = Barrier::new(workers);
        std::thread::scope(|scope| {
            for worker in 0..workers {
                let mask = &mask;
                let barrier = &barrier;
                scope.spawn(move || {
                    mask.reset_strided(worker, workers);
                    barrier.wait();
                    // After the barrier every participant observes a
                    // fully cleared mask.
                    for bit in (worker..300).step_by(workers) {
                        assert!(!mask.test(bit));
                    }
                });
            }
        });
        assert_eq!(mask.count_set(300), 0);
    }

    #[test]
    fn resized_preserves_bits() {
        let mask = Bitmask::new(50);
        for bit in [0usize, 7, 31, 32, 49] {
            mask.set(bit, false);
        }
        let grown = mask.resized(130);
        for bit in 0..50 {
            assert_eq!(grown.test(bit), mask.test(bit));
        }
        for bit in 50..130 {
            assert!(!grown.test(bit));
        }
    }

    #[test]
    fn num_bytes_rounds_up_to_words() {
        assert_eq!(Bitmask::num_bytes(0), 0);
        assert_eq!(Bitmask::num_bytes(1), 4);
        assert_eq!(Bitmask::num_bytes(32), 4);
        assert_eq!(Bitmask::num_bytes(33), 8);
    }
}
