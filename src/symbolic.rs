//! C string-table source for symbolic tags.
//!
//! The renderer keeps the most frequent key/value pairs as a compile-time
//! table so they can be stored as one-byte symbolic ids instead of full
//! strings. This module generates that table from a filtered histogram
//! sorted by descending count: two parallel `const char*` arrays,
//! `symbolic_tags_keys` and `symbolic_tags_values`.

use std::io::{BufRead, Write};

use crate::histogram::HistogramEntry;
use crate::{Error, Result};

/// Number of table slots; matches the one-byte symbolic id space.
pub const DEFAULT_LIMIT: usize = 256;

/// Reads up to `limit` entries from a `count§key§value` histogram.
///
/// Entries whose value contains the separator cannot be represented and
/// are skipped without consuming a slot.
pub fn collect_entries(reader: impl BufRead, limit: usize) -> Result<Vec<HistogramEntry>> {
    let mut entries = Vec::with_capacity(limit.min(DEFAULT_LIMIT));
    for (idx, line) in reader.lines().enumerate() {
        if entries.len() >= limit {
            break;
        }
        let line = line?;
        if let Some(entry) = HistogramEntry::parse_delimited(idx + 1, &line)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_array<'a>(
    out: &mut impl Write,
    name: &str,
    items: impl Iterator<Item = &'a str>,
) -> Result<()> {
    writeln!(out, "const char* {}[] = {{", name)?;
    let mut first = true;
    for item in items {
        if !first {
            writeln!(out, ",")?;
        }
        write!(out, "  \"{}\"", escape(item))?;
        first = false;
    }
    writeln!(out)?;
    writeln!(out, "}};")?;
    Ok(())
}

/// Writes the two parallel string-table arrays.
///
/// An empty table would produce C source that does not compile (empty
/// initializer lists), so it is rejected up front.
pub fn write_symbolic_tags(entries: &[HistogramEntry], mut out: impl Write) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::Config("no histogram entries to emit".into()));
    }
    write_array(&mut out, "symbolic_tags_keys", entries.iter().map(|e| e.key.as_str()))?;
    writeln!(out)?;
    write_array(
        &mut out,
        "symbolic_tags_values",
        entries.iter().map(|e| e.value.as_str()),
    )?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emits_parallel_arrays() {
        let input = "10§highway§residential\n7§name§Main Street\n";
        let entries = collect_entries(input.as_bytes(), DEFAULT_LIMIT).unwrap();
        let mut out = Vec::new();
        write_symbolic_tags(&entries, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "const char* symbolic_tags_keys[] = {\n  \"highway\",\n  \"name\"\n};\n\n\
             const char* symbolic_tags_values[] = {\n  \"residential\",\n  \"Main Street\"\n};\n"
        );
    }

    #[test]
    fn escapes_backslashes_and_quotes() {
        let input = "1§note§C:\\temp\n1§name§say \"hi\"\n";
        let entries = collect_entries(input.as_bytes(), DEFAULT_LIMIT).unwrap();
        let mut out = Vec::new();
        write_symbolic_tags(&entries, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\"C:\\\\temp\""));
        assert!(out.contains("\"say \\\"hi\\\"\""));
    }

    #[test]
    fn respects_the_limit_and_skips_unrepresentable_values() {
        let input = "5§a§1\n4§b§x§y\n3§c§2\n2§d§3\n";
        let entries = collect_entries(input.as_bytes(), 2).unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = write_symbolic_tags(&[], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
