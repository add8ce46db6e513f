//! Output formatting for search results

use crate::index::types::FileInfo;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Which engine produced a result group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Trie,
    Index,
}

impl Source {
    fn heading(self) -> &'static str {
        match self {
            Source::Trie => "TRIE RESULTS",
            Source::Index => "INVERTED INDEX RESULTS",
        }
    }
}

/// Print one group of results with a heading, filename highlighted
pub fn print_results(results: &[FileInfo], source: Source, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_results(&mut stdout, results, source)
}

/// Print results as a JSON array
pub fn print_json(results: &[FileInfo]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, results)?;
    writeln!(handle)
}

fn write_results<W: WriteColor>(out: &mut W, results: &[FileInfo], source: Source) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(out, "{}", source.heading())?;
    out.reset()?;

    if results.is_empty() {
        writeln!(out, "  (no matches)")?;
        return Ok(());
    }

    for info in results {
        write!(out, "  ")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(out, "{}", info.filename)?;
        out.reset()?;

        write!(out, "  ")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "{}", info.absolute_path)?;
        out.reset()?;
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    #[test]
    fn test_plain_rendering() {
        let mut out = NoColor::new(Vec::new());
        let results = vec![FileInfo::new("Doc1.txt", "/r/a/Doc1.txt", "txt")];
        write_results(&mut out, &results, Source::Trie).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "TRIE RESULTS\n  Doc1.txt  /r/a/Doc1.txt\n");
    }

    #[test]
    fn test_empty_rendering() {
        let mut out = NoColor::new(Vec::new());
        write_results(&mut out, &[], Source::Index).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.starts_with("INVERTED INDEX RESULTS\n"));
        assert!(text.contains("(no matches)"));
    }
}
