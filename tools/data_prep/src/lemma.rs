use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// What replaces the hyphenated second column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Form {
    /// `[lemma, suffix]`
    Suffix,
    /// `[lemma, lemma+suffix]`
    Inflected,
}

pub struct LemmaSplitter {
    pattern: Regex,
    form: Form,
}

impl LemmaSplitter {
    pub fn new(form: Form) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(r"^(\w+)-(\w+)")?,
            form,
        })
    }

    /// Rewrites one TSV row. Rows whose second column is not `stem-suffix`
    /// are returned unchanged.
    pub fn rewrite(&self, row: &str) -> Result<String> {
        let columns: Vec<&str> = row.split('\t').collect();
        let Some(second) = columns.get(1) else {
            bail!("expected at least two columns");
        };

        let out = match self.pattern.captures(second) {
            Some(caps) => {
                let lemma = &caps[1];
                let suffix = &caps[2];
                match self.form {
                    Form::Suffix => format!("{lemma}\t{suffix}"),
                    Form::Inflected => format!("{lemma}\t{lemma}{suffix}"),
                }
            }
            None => row.to_string(),
        };

        if out.starts_with('\t') {
            bail!("empty first column");
        }
        Ok(out)
    }

    pub fn rewrite_file(&self, input: &Path, output: &Path) -> Result<usize> {
        let reader = BufReader::new(
            File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
        );
        let mut writer = BufWriter::new(File::create(output)?);

        let mut count = 0;
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let row = self
                .rewrite(&line)
                .with_context(|| format!("{}:{}", input.display(), n + 1))?;
            writeln!(writer, "{}", row)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_hyphenated_form() {
        let splitter = LemmaSplitter::new(Form::Suffix).unwrap();
        assert_eq!(splitter.rewrite("inu\tinu-mia\tV").unwrap(), "inu\tmia");
    }

    #[test]
    fn test_inflected_form() {
        let splitter = LemmaSplitter::new(Form::Inflected).unwrap();
        assert_eq!(splitter.rewrite("inu\tinu-mia").unwrap(), "inu\tinumia");
    }

    #[test]
    fn test_unicode_stems() {
        let splitter = LemmaSplitter::new(Form::Suffix).unwrap();
        assert_eq!(splitter.rewrite("tā\ttā-ia").unwrap(), "tā\tia");
    }

    #[test]
    fn test_unhyphenated_row_kept() {
        let splitter = LemmaSplitter::new(Form::Suffix).unwrap();
        assert_eq!(splitter.rewrite("kite\tkitea").unwrap(), "kite\tkitea");
    }

    #[test]
    fn test_malformed_rows() {
        let splitter = LemmaSplitter::new(Form::Suffix).unwrap();
        assert!(splitter.rewrite("single").is_err());
        assert!(splitter.rewrite("\tkitea").is_err());
    }

    #[test]
    fn test_error_names_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tsv");
        std::fs::write(&input, "a\ta-ia\nbroken\n").unwrap();
        let splitter = LemmaSplitter::new(Form::Suffix).unwrap();
        let err = splitter
            .rewrite_file(&input, &dir.path().join("out.tsv"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains(":2"));
    }
}
