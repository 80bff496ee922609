use game_types::GameError;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::Path;

/// Number of candidate words offered to the drawer each round.
pub const DEFAULT_OPTION_COUNT: usize = 3;

/// Built-in corpus, grouped by theme.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "animals",
        &[
            "cat", "dog", "elephant", "giraffe", "monkey", "tiger", "zebra", "lion", "penguin",
            "kangaroo", "koala", "dolphin", "shark", "whale", "octopus", "butterfly", "spider",
            "snake", "turtle",
        ],
    ),
    (
        "objects",
        &[
            "chair", "table", "lamp", "computer", "phone", "television", "clock", "book",
            "guitar", "piano", "camera", "umbrella", "glasses", "hat", "shoe", "key", "door",
            "window", "balloon", "backpack",
        ],
    ),
    (
        "food",
        &[
            "pizza", "hamburger", "ice cream", "cake", "cookie", "banana", "apple", "orange",
            "watermelon", "popcorn", "sandwich", "pasta", "sushi", "taco", "donut", "coffee",
            "tea", "milk", "chocolate",
        ],
    ),
    (
        "places",
        &[
            "beach", "mountain", "park", "school", "hospital", "castle", "island", "forest",
            "city", "farm",
        ],
    ),
    (
        "actions",
        &[
            "running", "swimming", "dancing", "singing", "jumping", "drawing", "sleeping",
            "eating", "reading",
        ],
    ),
    (
        "sports",
        &[
            "football", "basketball", "tennis", "baseball", "golf", "hockey", "volleyball",
            "skateboarding",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
    lookup: HashSet<String>,
}

impl WordBank {
    /// Bank holding the built-in themed corpus
    pub fn with_default_words() -> Self {
        Self::from_words(
            DEFAULT_CATEGORIES
                .iter()
                .flat_map(|(_, words)| words.iter().copied()),
        )
    }

    /// Parse a word list: one word or phrase per line, `#` starts a comment line.
    pub fn from_word_list(word_list: &str) -> Self {
        Self::from_words(
            word_list
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let bank = Self::from_word_list(&contents);
        tracing::info!(
            "Loaded {} words from {}",
            bank.len(),
            path.as_ref().display()
        );
        Ok(bank)
    }

    /// Normalizes to lowercase and drops duplicates, keeping first occurrence order.
    pub fn from_words<'a, I>(words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lookup = HashSet::new();
        let mut ordered = Vec::new();
        for word in words {
            let word = word.trim().to_lowercase();
            if word.is_empty() {
                continue;
            }
            if lookup.insert(word.clone()) {
                ordered.push(word);
            }
        }

        Self {
            words: ordered,
            lookup,
        }
    }

    /// Uniform sample of `count` distinct words, without replacement.
    pub fn sample_options<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<String>, GameError> {
        if count > self.words.len() {
            return Err(GameError::CapacityExceeded {
                requested: count,
                available: self.words.len(),
            });
        }

        Ok(self
            .words
            .choose_multiple(rng, count)
            .cloned()
            .collect())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(&word.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Theme of a built-in word, if it comes from the default corpus
    pub fn category_of(word: &str) -> Option<&'static str> {
        let word = word.trim().to_lowercase();
        DEFAULT_CATEGORIES
            .iter()
            .find(|(_, words)| words.iter().any(|w| *w == word))
            .map(|(category, _)| *category)
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self::with_default_words()
    }
}
