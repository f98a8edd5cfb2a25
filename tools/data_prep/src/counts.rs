use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Short and long vowels that may end a stem.
pub const VOWELS: [char; 10] = ['a', 'e', 'i', 'o', 'u', 'ā', 'ē', 'ī', 'ō', 'ū'];

/// Counter that reports entries most common first, ties in first-seen order.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    counts: HashMap<K, (usize, usize)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        let next = self.counts.len();
        self.counts.entry(key).or_insert((0, next)).0 += 1;
    }

    pub fn get(&self, key: &K) -> usize {
        self.counts.get(key).map_or(0, |&(count, _)| count)
    }

    pub fn most_common(&self) -> Vec<(K, usize)> {
        let mut entries: Vec<_> = self
            .counts
            .iter()
            .map(|(k, &(count, order))| (k.clone(), count, order))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        entries.into_iter().map(|(k, count, _)| (k, count)).collect()
    }
}

impl<K: Eq + Hash + Clone> Default for Tally<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stem-final vowel and final-vowel/suffix counts over `[lemma, suffix]` rows.
#[derive(Debug, Default)]
pub struct FinalVowelCounts {
    pub vowels: Tally<char>,
    pub pairs: Tally<(char, String)>,
}

impl FinalVowelCounts {
    /// Counts one row. Lemmas ending in a consonant are skipped.
    pub fn observe(&mut self, lemma: &str, suffix: &str) {
        if let Some(vowel) = lemma.chars().last().filter(|c| VOWELS.contains(c)) {
            self.vowels.add(vowel);
            self.pairs.add((vowel, suffix.to_string()));
        }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut counts = Self::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let mut columns = line.split('\t');
            match (columns.next(), columns.next(), columns.next()) {
                (Some(lemma), Some(suffix), None) => counts.observe(lemma, suffix),
                _ => bail!("line {}: expected `lemma<TAB>suffix`", n + 1),
            }
        }
        Ok(counts)
    }

    /// P(suffix | final vowel), in the pairs' most-common order.
    pub fn probabilities(&self) -> Vec<(char, String, f64)> {
        self.pairs
            .most_common()
            .into_iter()
            .map(|((vowel, suffix), count)| {
                let p = count as f64 / self.vowels.get(&vowel) as f64;
                (vowel, suffix, p)
            })
            .collect()
    }
}

/// Output locations for `data_prep counts`.
pub struct CountsOutput<'a> {
    pub vowel_counts: &'a Path,
    pub pair_counts: &'a Path,
    pub probabilities: &'a Path,
}

pub fn count_file(input: &Path, out: &CountsOutput<'_>) -> Result<FinalVowelCounts> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let counts = FinalVowelCounts::from_reader(BufReader::new(file))
        .with_context(|| input.display().to_string())?;

    let mut writer = BufWriter::new(File::create(out.vowel_counts)?);
    for (vowel, count) in counts.vowels.most_common() {
        writeln!(writer, "{}\t{}", vowel, count)?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(out.pair_counts)?);
    for ((vowel, suffix), count) in counts.pairs.most_common() {
        writeln!(writer, "{}\t{}\t{}", vowel, suffix, count)?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(out.probabilities)?);
    for (vowel, suffix, p) in counts.probabilities() {
        writeln!(writer, "{}\t{}\t{}", vowel, suffix, p)?;
    }
    writer.flush()?;

    Ok(counts)
}
