use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Splits one comma-separated row. Double-quoted fields may contain commas and
/// `""` stands for a literal quote.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn read_rows(path: &Path) -> Result<Option<Vec<Vec<String>>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let rows = content
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.is_empty())
        .map(split_row)
        .collect();
    Ok(Some(rows))
}

/// Substrings a channel name must contain to be kept. Only the first column is used.
pub fn load_filters(path: &Path) -> Result<Vec<String>> {
    let Some(rows) = read_rows(path)? else {
        warn!("Filter file {} does not exist!", path.display());
        return Ok(Vec::new());
    };

    let filters: Vec<String> = rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    info!("Loaded {} filters from {}", filters.len(), path.display());
    Ok(filters)
}

/// Ordered `old,new` pairs. Rows with any other column count are ignored; a
/// repeated `old` keeps its first position and takes the last value.
pub fn load_replacements(path: &Path) -> Result<Vec<(String, String)>> {
    let Some(rows) = read_rows(path)? else {
        warn!("Replacements file {} does not exist!", path.display());
        return Ok(Vec::new());
    };

    let mut replacements: Vec<(String, String)> = Vec::new();
    for row in rows {
        let [old, new]: [String; 2] = match row.try_into() {
            Ok(pair) => pair,
            Err(_) => continue,
        };
        match replacements.iter_mut().find(|(o, _)| *o == old) {
            Some(existing) => existing.1 = new,
            None => replacements.push((old, new)),
        }
    }

    info!("Loaded {} name replacements from {}", replacements.len(), path.display());
    Ok(replacements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_row() {
        assert_eq!(split_row("a,b"), vec!["a", "b"]);
        assert_eq!(split_row(r#""a, b",c"#), vec!["a, b", "c"]);
        assert_eq!(split_row(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(split_row("single"), vec!["single"]);
    }

    #[test]
    fn test_load_filters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.csv");
        std::fs::write(&path, "DAZN,ignored\n\n  [ES] \nEurosport\r\n").unwrap();

        let filters = load_filters(&path).unwrap();
        assert_eq!(filters, vec!["DAZN", "[ES]", "Eurosport"]);
    }

    #[test]
    fn test_load_replacements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replacements.csv");
        std::fs::write(&path, "Movistar,M+\nthree,columns,here\nHD ,\nMovistar,Movi\n").unwrap();

        let replacements = load_replacements(&path).unwrap();
        assert_eq!(
            replacements,
            vec![
                ("Movistar".to_string(), "Movi".to_string()),
                ("HD ".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_filters(&dir.path().join("missing.csv")).unwrap().is_empty());
        assert!(load_replacements(&dir.path().join("missing.csv")).unwrap().is_empty());
    }
}
