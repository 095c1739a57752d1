//! Statistics reports: a plain aligned table followed by the same table as a
//! LaTeX `tabular`, one `<slug>.txt` per comparison frame.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tabwriter::TabWriter;
use tracing::debug;

use pdv_core::{slugify, summarize, ComparisonFrame, PdvError, PdvResult, StatisticsMode, StatsTable};

/// Column-aligned text rendering; the top-left header cell is blank.
pub fn render_plain(table: &StatsTable) -> PdvResult<String> {
    let mut writer = TabWriter::new(Vec::new()).padding(2);
    write!(writer, "\t")?;
    for column in &table.columns {
        write!(writer, "{column}\t")?;
    }
    writeln!(writer)?;
    for (label, row) in table.row_labels.iter().zip(&table.cells) {
        write!(writer, "{label}\t")?;
        for cell in row {
            write!(writer, "{cell}\t")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|err| io::Error::other(err.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|err| PdvError::Parse(err.to_string()))?;
    Ok(text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// `tabular` environment with `\hline` rules around the header.
pub fn render_latex(table: &StatsTable) -> String {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.row_labels.len() + 1);
    grid.push(
        std::iter::once(String::new())
            .chain(table.columns.iter().map(|c| escape_latex(c)))
            .collect(),
    );
    for (label, row) in table.row_labels.iter().zip(&table.cells) {
        grid.push(
            std::iter::once(escape_latex(label))
                .chain(row.iter().map(|c| escape_latex(c)))
                .collect(),
        );
    }

    let n_cols = table.columns.len() + 1;
    let widths: Vec<usize> = (0..n_cols)
        .map(|col| grid.iter().filter_map(|r| r.get(col)).map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();
    let line = |row: &[String]| {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("{} \\\\", cells.join(" & "))
    };

    let mut out = Vec::with_capacity(grid.len() + 5);
    out.push(format!("\\begin{{tabular}}{{{}}}", "l".repeat(n_cols)));
    out.push("\\hline".to_string());
    out.push(line(&grid[0]));
    out.push("\\hline".to_string());
    for row in &grid[1..] {
        out.push(line(row));
    }
    out.push("\\hline".to_string());
    out.push("\\end{tabular}".to_string());
    out.join("\n")
}

fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '&' | '#' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Summarizes `frame` and writes its report into `dir`, returning the file path.
pub fn write_report(frame: &ComparisonFrame, statistics: StatisticsMode, dir: &Path) -> PdvResult<PathBuf> {
    let table = summarize(frame, statistics);
    let contents = format!("{}\n\n{}", render_plain(&table)?, render_latex(&table));
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.txt", slugify(&frame.name)));
    fs::write(&path, contents)?;
    debug!(frame = %frame.name, path = %path.display(), "wrote report");
    Ok(path)
}

/// [`write_report`] with the statistics mode given by name. The name is
/// checked before anything touches the filesystem.
pub fn display_table(frame: &ComparisonFrame, statistics: &str, dir: &Path) -> PdvResult<PathBuf> {
    let statistics: StatisticsMode = statistics.parse()?;
    write_report(frame, statistics, dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdv_core::{FrameColumn, Values};
    use tempfile::tempdir;

    fn frame(name: &str, columns: Vec<(&str, Values)>) -> ComparisonFrame {
        let rows = columns[0].1.len();
        ComparisonFrame {
            name: name.into(),
            index: (0..rows).map(|i| i.to_string()).collect(),
            columns: columns
                .into_iter()
                .map(|(version, values)| FrameColumn {
                    version: version.into(),
                    values,
                })
                .collect(),
            range: None,
        }
    }

    fn bool_frame() -> ComparisonFrame {
        frame(
            "line_in_service",
            vec![
                ("reference", Values::from_bools([true, true])),
                ("generated", Values::from_bools([true, true])),
            ],
        )
    }

    #[test]
    fn plain_table_aligns_columns() {
        let table = StatsTable {
            title: "t".into(),
            row_labels: vec!["count".into(), "mean".into()],
            columns: vec!["v1".into(), "version2".into()],
            cells: vec![
                vec!["4.00e+00".into(), "4.00e+00".into()],
                vec!["2.50e+00".into(), "-1.00e+00".into()],
            ],
        };
        let text = render_plain(&table).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "       v1        version2");
        assert_eq!(lines[1], "count  4.00e+00  4.00e+00");
        assert_eq!(lines[2], "mean   2.50e+00  -1.00e+00");
    }

    #[test]
    fn latex_escapes_percent_signs() {
        let table = summarize(&bool_frame(), StatisticsMode::Summary);
        let latex = render_latex(&table);
        assert!(latex.starts_with("\\begin{tabular}{ll}"));
        assert!(latex.contains("100.0\\%"));
        assert!(latex.contains("Percentage"));
        assert!(latex.ends_with("\\end{tabular}"));
    }

    #[test]
    fn report_file_holds_both_blocks() {
        let dir = tempdir().unwrap();
        let path = write_report(&bool_frame(), StatisticsMode::Summary, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "line_in_service.txt");
        let text = fs::read_to_string(&path).unwrap();
        let (plain, latex) = text.split_once("\n\n").unwrap();
        assert!(plain.contains("reference  100.0%"));
        assert!(latex.contains("\\begin{tabular}"));
    }

    #[test]
    fn unknown_statistics_mode_writes_nothing() {
        let root = tempdir().unwrap();
        let out = root.path().join("table");
        let err = display_table(&bool_frame(), "median", &out).unwrap_err();
        assert!(matches!(err, PdvError::Config(_)));
        assert!(err.to_string().contains("median"));
        assert!(!out.exists());
    }

    #[test]
    fn correlation_report_is_written_for_float_frames() {
        let dir = tempdir().unwrap();
        let values = Values::from_floats([1.0, 2.0, 4.0]);
        let f = frame("Bus voltage - s1", vec![("a", values.clone()), ("b", values)]);
        let path = display_table(&f, "correlation", dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "bus-voltage-s1.txt");
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("1.00e+00"));
    }
}
