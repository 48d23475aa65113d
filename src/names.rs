use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FIRST_NAMES: [&str; 16] = [
    "Ada", "Bjorn", "Cira", "Dag", "Eira", "Finn", "Greta", "Hans", "Ingrid", "Jorn", "Kira",
    "Lars", "Mira", "Nils", "Olga", "Per",
];

const LAST_NAMES: [&str; 16] = [
    "Stone", "River", "Hill", "Wood", "Field", "Brook", "Dale", "Marsh", "Glen", "Vale", "Cliff",
    "Shore", "Moor", "Heath", "Fen", "Wold",
];

const BUSINESS_SUFFIXES: [&str; 6] = ["& Sons", "& Co", "Brothers", "Collective", "House", "Ltd"];

/// Display names for the people and businesses the engine creates.
/// Uniqueness is not required.
pub trait NameGenerator {
    fn person_name(&mut self) -> String;
    fn business_name(&mut self, kind: &str) -> String;
}

/// Word-list names drawn from a private stream so that naming never shifts
/// the simulation's own random draws.
pub struct WordListNames {
    rng: ChaCha8Rng,
}

impl WordListNames {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or("Nobody")
    }
}

impl NameGenerator for WordListNames {
    fn person_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        format!("{first} {last}")
    }

    fn business_name(&mut self, kind: &str) -> String {
        let owner = self.pick(&LAST_NAMES);
        let suffix = self.pick(&BUSINESS_SUFFIXES);
        format!("{owner} {kind} {suffix}")
    }
}

/// Numbered names ("person 3", "cafe 12"); handy in tests and logs.
#[derive(Debug, Default)]
pub struct SequentialNames {
    people: u64,
    businesses: u64,
}

impl NameGenerator for SequentialNames {
    fn person_name(&mut self) -> String {
        self.people += 1;
        format!("person {}", self.people)
    }

    fn business_name(&mut self, kind: &str) -> String {
        self.businesses += 1;
        format!("{kind} {}", self.businesses)
    }
}
