//! Whitespace-delimited numeric text files.
//!
//! Blank lines and lines starting with `#` are skipped. A single header line made
//! only of non-numeric tokens is allowed before the first data row.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TextError {
    #[display("error opening file '{}'", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("I/O error: {_0}")]
    Io(#[error(source)] io::Error),
    #[display("line {line}: cannot parse '{token}' as a number")]
    Parse { line: usize, token: String },
    #[display("line {line}: expected at least {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl From<io::Error> for TextError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Reads the first `expected_columns` numbers of every data row of `path`.
///
/// Extra columns are ignored; fewer columns are an error.
pub fn read_columns(
    path: impl AsRef<Path>,
    expected_columns: usize,
) -> Result<Vec<Vec<f64>>, TextError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TextError::Open {
        path: path.to_owned(),
        source,
    })?;
    let rows = parse_columns(BufReader::new(file), expected_columns)?;
    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Reads a single-column file into a flat vector.
pub fn read_values(path: impl AsRef<Path>) -> Result<Vec<f64>, TextError> {
    Ok(read_columns(path, 1)?
        .into_iter()
        .map(|row| row[0])
        .collect())
}

/// Parses rows from any buffered reader; see [`read_columns`].
///
/// # Examples
///
/// ```
/// # use statlab_data::text::parse_columns;
/// let input = "# year temperature\nyear temp\n1990 14.1\n\n1991 14.3 extra\n";
/// let rows = parse_columns(input.as_bytes(), 2).unwrap();
/// assert_eq!(rows, vec![vec![1990.0, 14.1], vec![1991.0, 14.3]]);
/// ```
pub fn parse_columns<R: BufRead>(
    reader: R,
    expected_columns: usize,
) -> Result<Vec<Vec<f64>>, TextError> {
    let mut rows = Vec::new();
    let mut header_allowed = true;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens = trimmed.split_whitespace().collect::<Vec<_>>();
        if header_allowed && tokens.iter().all(|t| t.parse::<f64>().is_err()) {
            header_allowed = false;
            continue;
        }
        header_allowed = false;

        if tokens.len() < expected_columns {
            return Err(TextError::ColumnCount {
                line: line_no,
                expected: expected_columns,
                found: tokens.len(),
            });
        }
        let row = tokens[..expected_columns]
            .iter()
            .map(|token| {
                token.parse::<f64>().map_err(|_| TextError::Parse {
                    line: line_no,
                    token: (*token).to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Writes rows as space-separated columns, preceded by an optional header line.
///
/// Values use Rust's shortest round-trip formatting, so [`parse_columns`] reads
/// back exactly the numbers that were written.
///
/// # Examples
///
/// ```
/// # use statlab_data::text::{parse_columns, write_columns};
/// let rows = vec![vec![1.0, 0.1], vec![2.0, -3.25e-7]];
/// let mut out = Vec::new();
/// write_columns(&mut out, Some("x y"), &rows).unwrap();
/// assert_eq!(parse_columns(out.as_slice(), 2).unwrap(), rows);
/// ```
pub fn write_columns<W: Write>(
    writer: &mut W,
    header: Option<&str>,
    rows: &[Vec<f64>],
) -> Result<(), TextError> {
    if let Some(header) = header {
        writeln!(writer, "{header}")?;
    }
    for row in rows {
        let line = row
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// [`write_columns`] into a newly created file at `path`.
pub fn write_columns_file(
    path: impl AsRef<Path>,
    header: Option<&str>,
    rows: &[Vec<f64>],
) -> Result<(), TextError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| TextError::Open {
        path: path.to_owned(),
        source,
    })?;
    write_columns(&mut BufWriter::new(file), header, rows)?;
    log::debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_one_header_line() {
        let err = parse_columns("x y\nnot numbers\n".as_bytes(), 2).unwrap_err();
        assert!(matches!(err, TextError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_column_count_error_carries_line() {
        let err = parse_columns("1 2 3\n4 5\n".as_bytes(), 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: expected at least 3 columns, found 2"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = read_columns("/nonexistent/chargedata.txt", 1).unwrap_err();
        assert!(err.to_string().starts_with("error opening file"));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("statlab-text-{}.dat", std::process::id()));
        let rows = vec![vec![0.0, 1.0, 0.5], vec![1e300, -0.1, 0.5]];
        write_columns_file(&path, Some("x y sigma"), &rows).unwrap();
        let read = read_columns(&path, 3).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn test_scientific_notation() {
        let rows = parse_columns("1e-3 -2.5E2\n".as_bytes(), 2).unwrap();
        assert_eq!(rows, vec![vec![0.001, -250.0]]);
    }
}
