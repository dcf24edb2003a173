//! Blanking of repeated leading key columns.

use super::schema::DiffRow;

/// Blank leading key columns that repeat the row above
///
/// For each row after the first, counts how many of its first `trim` key
/// columns equal the previous row's, stopping at the first difference, and
/// blanks that many. Comparison always uses the values from before any
/// blanking, so a blanked cell still groups with the cell it repeats.
pub fn trim_rows(rows: &mut [DiffRow], trim: usize) {
    if trim == 0 || rows.len() < 2 {
        return;
    }

    let counts: Vec<usize> = rows
        .windows(2)
        .map(|pair| leading_equal(&pair[0].key, &pair[1].key, trim))
        .collect();

    for (row, count) in rows.iter_mut().skip(1).zip(counts) {
        for cell in row.key.iter_mut().take(count) {
            *cell = None;
        }
    }
}

/// Number of leading columns equal in both rows, at most `limit`
fn leading_equal(above: &[Option<String>], below: &[Option<String>], limit: usize) -> usize {
    above
        .iter()
        .zip(below)
        .take(limit)
        .take_while(|(a, b)| a.is_some() && a == b)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::schema::Measure;

    fn row(key: &[&str]) -> DiffRow {
        DiffRow {
            key: key.iter().map(|k| Some(k.to_string())).collect(),
            measure: Measure::Private,
            values: vec![0, 8],
            rank: 4.0,
        }
    }

    fn keys(rows: &[DiffRow]) -> Vec<Vec<Option<&str>>> {
        rows.iter()
            .map(|r| r.key.iter().map(|k| k.as_deref()).collect())
            .collect()
    }

    #[test]
    fn test_trim_blanks_repeats() {
        let mut rows = vec![
            row(&["app", "0", "code"]),
            row(&["app", "0", "data"]),
            row(&["app", "1", "data"]),
            row(&["bin", "1", "data"]),
        ];
        trim_rows(&mut rows, 4);

        assert_eq!(
            keys(&rows),
            vec![
                vec![Some("app"), Some("0"), Some("code")],
                vec![None, None, Some("data")],
                vec![None, Some("1"), Some("data")],
                vec![Some("bin"), Some("1"), Some("data")],
            ]
        );
    }

    #[test]
    fn test_trim_level_limits_columns() {
        let mut rows = vec![row(&["app", "0"]), row(&["app", "0"])];
        trim_rows(&mut rows, 1);
        assert_eq!(keys(&rows)[1], vec![None, Some("0")]);
    }

    #[test]
    fn test_trim_zero_is_noop() {
        let mut rows = vec![row(&["app"]), row(&["app"])];
        trim_rows(&mut rows, 0);
        assert_eq!(keys(&rows)[1], vec![Some("app")]);
    }
}
