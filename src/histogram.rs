//! Key/value tag histograms.
//!
//! The raw histograms are produced by piping a tag dump through
//! `sort | uniq -c`, giving lines of the form
//!
//! ```text
//!    4711 highway§residential
//! ```
//!
//! with a possibly left-padded count, a single space, and the key and value
//! separated by `§`. Filtered histograms re-emit the count as a regular
//! `§`-delimited first column (`4711§highway§residential`).
//!
//! Keys that carry no information for map rendering (metadata like
//! `created_by`, import artifacts, ...) are maintained as string literals in
//! a C source file; [`IgnoreKeys`] scrapes that file so the analysis tools
//! and the renderer agree on the same list.

use std::io::{BufRead, Write};

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

use crate::{Error, Result};

/// Separator between the key and value columns of a histogram line.
pub const SEPARATOR: char = '§';

/// One histogram row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramEntry {
    pub count: u64,
    pub key: String,
    pub value: String,
}

impl HistogramEntry {
    /// Parses a `uniq -c` style line: padded count, space, `key§value`.
    ///
    /// A missing value column is allowed (bare keys occur in key-only
    /// dumps); anything after a second separator is dropped.
    pub fn parse_uniq(lineno: usize, line: &str) -> Result<Self> {
        let trimmed = line.trim_start();
        let (count, rest) = trimmed
            .split_once(' ')
            .ok_or_else(|| Error::parse(lineno, "expected a count followed by a tag"))?;
        let count = count
            .parse::<u64>()
            .map_err(|e| Error::parse(lineno, format!("invalid count {:?}: {}", count, e)))?;
        let (key, value) = match rest.split_once(SEPARATOR) {
            Some((key, value)) => (key, value.split(SEPARATOR).next().unwrap_or("")),
            None => (rest, ""),
        };
        Ok(Self {
            count,
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Parses a `§`-delimited line: `count§key§value`.
    ///
    /// Returns `Ok(None)` for lines with more than three columns, i.e.
    /// values that themselves contain the separator; those cannot be
    /// represented downstream and are skipped rather than rejected.
    pub fn parse_delimited(lineno: usize, line: &str) -> Result<Option<Self>> {
        let mut parts = line.split(SEPARATOR);
        let entry = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(count), Some(key), Some(value), None) => {
                let count = count.parse::<u64>().map_err(|e| {
                    Error::parse(lineno, format!("invalid count {:?}: {}", count, e))
                })?;
                Some(Self {
                    count,
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
            (Some(_), Some(_), Some(_), Some(_)) => None,
            _ => return Err(Error::parse(lineno, "expected count§key§value")),
        };
        Ok(entry)
    }
}

/// Set of tag keys excluded from all statistics.
#[derive(Debug, Default, Clone)]
pub struct IgnoreKeys {
    keys: AHashSet<String>,
}

impl IgnoreKeys {
    /// Scrapes key string literals from a C source file.
    ///
    /// Every line containing exactly two double quotes contributes the
    /// quoted string; all other lines (declarations, braces, comments) are
    /// passed over.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut keys = AHashSet::new();
        for line in reader.lines() {
            let line = line?;
            if line.matches('"').count() != 2 {
                continue;
            }
            let mut parts = line.split('"');
            parts.next();
            if let Some(key) = parts.next() {
                keys.insert(key.to_string());
            }
        }
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Aggregates per-key totals over a `uniq -c` histogram, skipping ignored
/// keys, and returns them sorted by descending count (ties by key).
pub fn key_frequencies(
    reader: impl BufRead,
    ignore: &IgnoreKeys,
) -> Result<Vec<(u64, String)>> {
    let mut totals: AHashMap<String, u64> = AHashMap::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let entry = HistogramEntry::parse_uniq(idx + 1, &line)?;
        if ignore.contains(&entry.key) {
            continue;
        }
        *totals.entry(entry.key).or_insert(0) += entry.count;
    }
    Ok(totals
        .into_iter()
        .map(|(key, count)| (count, key))
        .sorted_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)))
        .collect())
}

/// Streams a `uniq -c` histogram, dropping entries with ignored keys and
/// re-emitting the rest as `count§key§value` lines.
pub fn filter_histogram(
    reader: impl BufRead,
    ignore: &IgnoreKeys,
    mut out: impl Write,
) -> Result<()> {
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let entry = HistogramEntry::parse_uniq(idx + 1, &line)?;
        if ignore.contains(&entry.key) {
            continue;
        }
        writeln!(
            out,
            "{}{sep}{}{sep}{}",
            entry.count,
            entry.key,
            entry.value,
            sep = SEPARATOR
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const IGNORE_SRC: &str = r#"
const char * ignore_keys[] = {
  "created_by",
  "source",
  "tiger:cfcc",
};
uint32_t num_ignore_keys = 3;
"#;

    fn ignore() -> IgnoreKeys {
        IgnoreKeys::from_reader(IGNORE_SRC.as_bytes()).unwrap()
    }

    #[test]
    fn scrapes_quoted_keys_only() {
        let ignore = ignore();
        assert_eq!(ignore.len(), 3);
        assert!(ignore.contains("created_by"));
        assert!(ignore.contains("tiger:cfcc"));
        assert!(!ignore.contains("highway"));
        // declaration lines carry no quotes and contribute nothing
        assert!(!ignore.contains("ignore_keys"));
    }

    #[test]
    fn parses_padded_uniq_lines() {
        let e = HistogramEntry::parse_uniq(1, "   4711 highway§residential").unwrap();
        assert_eq!(e.count, 4711);
        assert_eq!(e.key, "highway");
        assert_eq!(e.value, "residential");

        let bare = HistogramEntry::parse_uniq(1, "      9 fixme").unwrap();
        assert_eq!((bare.count, bare.key.as_str(), bare.value.as_str()), (9, "fixme", ""));
    }

    #[test]
    fn rejects_malformed_uniq_lines() {
        assert!(matches!(
            HistogramEntry::parse_uniq(3, "abc xyz"),
            Err(Error::Parse { line: 3, .. })
        ));
        assert!(matches!(
            HistogramEntry::parse_uniq(4, "justoneword"),
            Err(Error::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn parses_delimited_lines_and_skips_extra_columns() {
        let e = HistogramEntry::parse_delimited(1, "12§name§Berlin").unwrap().unwrap();
        assert_eq!((e.count, e.key.as_str(), e.value.as_str()), (12, "name", "Berlin"));

        // a value containing the separator is skipped, not an error
        assert!(HistogramEntry::parse_delimited(2, "3§note§a§b").unwrap().is_none());

        assert!(matches!(
            HistogramEntry::parse_delimited(5, "nocount"),
            Err(Error::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn aggregates_and_sorts_key_frequencies() {
        let input = "\
     10 highway§residential
      5 created_by§JOSM
      7 highway§primary
      3 name§Main Street
      3 amenity§pub
";
        let freqs = key_frequencies(input.as_bytes(), &ignore()).unwrap();
        assert_eq!(
            freqs,
            vec![
                (17, "highway".to_string()),
                (3, "amenity".to_string()),
                (3, "name".to_string()),
            ]
        );
    }

    #[test]
    fn filter_drops_ignored_keys_and_reformats() {
        let input = "     10 highway§residential\n      5 source§survey\n      2 name§X§Y\n";
        let mut out = Vec::new();
        filter_histogram(input.as_bytes(), &ignore(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "10§highway§residential\n2§name§X\n"
        );
    }

    #[test]
    fn malformed_line_aborts_aggregation() {
        let input = "     10 highway§residential\nnot a histogram\n";
        assert!(matches!(
            key_frequencies(input.as_bytes(), &ignore()),
            Err(Error::Parse { line: 2, .. })
        ));
    }
}
