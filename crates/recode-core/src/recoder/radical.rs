//! Han radical-stroke table parsing.
//!
//! Each non-comment line is `<codepoint-decimal> <radical> [<radical> ...]`,
//! whitespace separated. `#` starts a comment line.

use std::collections::HashMap;

use super::RecodeError;

/// Codepoint → radical/stroke components.
pub type RadicalTable = HashMap<u32, Vec<u32>>;

/// Radix used to hash a radical list and to offset the disambiguation element.
pub(super) const RADICAL_RADIX: u32 = 29;

pub fn parse_radical_table(content: &str) -> Result<RadicalTable, RecodeError> {
    let mut table = RadicalTable::new();
    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let bad = |reason: &str| RecodeError::RadicalTable {
            line: i + 1,
            reason: reason.to_string(),
        };
        let mut fields = line.split_whitespace();
        let codepoint: u32 = fields
            .next()
            .ok_or_else(|| bad("missing codepoint"))?
            .parse()
            .map_err(|_| bad("codepoint is not a decimal integer"))?;
        let radicals = fields
            .map(|f| f.parse::<u32>())
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|_| bad("radical is not a decimal integer"))?;
        if radicals.is_empty() {
            return Err(bad("no radicals"));
        }
        table.insert(codepoint, radicals);
    }
    Ok(table)
}

/// Fold a radical list into a single key for counting collisions.
pub(super) fn radical_pre_hash(radicals: &[u32]) -> u64 {
    radicals.iter().fold(0u64, |hash, &r| {
        hash.wrapping_mul(RADICAL_RADIX as u64)
            .wrapping_add(r as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let table = parse_radical_table("# comment\n27700 85 2\n\n27743 85 5\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&27700], vec![85, 2]);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_radical_table("27700\n").unwrap_err();
        assert!(matches!(err, RecodeError::RadicalTable { line: 1, .. }));
        let err = parse_radical_table("# ok\nabc 1\n").unwrap_err();
        assert!(matches!(err, RecodeError::RadicalTable { line: 2, .. }));
        let err = parse_radical_table("27700 x\n").unwrap_err();
        assert!(matches!(err, RecodeError::RadicalTable { .. }));
    }

    #[test]
    fn test_pre_hash_distinguishes_order() {
        assert_ne!(radical_pre_hash(&[1, 2]), radical_pre_hash(&[2, 1]));
        assert_eq!(radical_pre_hash(&[3]), 3);
    }
}
