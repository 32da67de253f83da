//! Synthetic text for benchmark runs
//!
//! One random template of `item_size` characters is generated and reused for
//! every item, so building a large corpus costs one allocation per copy at most.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random text of exactly `chars` characters drawn from the Basic Multilingual
/// Plane (surrogate code points are skipped).
pub fn random_text<R: Rng>(rng: &mut R, chars: usize) -> String {
    let mut text = String::with_capacity(chars * 3);
    let mut count = 0;
    while count < chars {
        if let Some(c) = char::from_u32(rng.gen_range(0..0xFFFF)) {
            text.push(c);
            count += 1;
        }
    }
    text
}

#[derive(Debug, Clone)]
pub struct Corpus {
    template: String,
    copies: usize,
}

impl Corpus {
    pub fn generate(item_size: usize, copies: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            template: random_text(&mut rng, item_size),
            copies,
        }
    }

    /// Every item, borrowed from the shared template.
    pub fn items(&self) -> Vec<&str> {
        std::iter::repeat(self.template.as_str())
            .take(self.copies)
            .collect()
    }

    /// All copies concatenated into one string.
    pub fn joined(&self) -> String {
        self.template.repeat(self.copies)
    }

    pub fn item_bytes(&self) -> usize {
        self.template.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.item_bytes() as u64 * self.copies as u64
    }
}
