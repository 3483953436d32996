/// Id minting for templates, sentences, content items and stories.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of fresh ids. Every id is `<prefix>-<suffix>`, where the suffix is
/// never repeated by the same source.
pub trait IdSource {
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Random ids from a seeded RNG. Distinct seeds keep separate sessions from
/// colliding; a fixed seed gives reproducible ids.
#[derive(Debug, Clone)]
pub struct SeededIds {
    rng: StdRng,
    issued: u64,
}

impl SeededIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: 0,
        }
    }

    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: 0,
        }
    }
}

impl IdSource for SeededIds {
    fn next_id(&mut self, prefix: &str) -> String {
        let n = self.issued;
        self.issued += 1;
        // the counter keeps ids unique even if the RNG repeats itself
        format!("{}-{:x}-{:012x}", prefix, n, self.rng.gen::<u64>() & 0xffff_ffff_ffff)
    }
}

/// Counting ids, optionally under a namespace: `template-0`, `sentence-1`,
/// or `picnic-blank-2` with namespace `picnic`.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    namespace: Option<String>,
    next: u64,
}

impl SequentialIds {
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            next: 0,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        let n = self.next;
        self.next += 1;
        match &self.namespace {
            Some(ns) => format!("{}-{}-{}", ns, prefix, n),
            None => format!("{}-{}", prefix, n),
        }
    }
}
