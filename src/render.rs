use crate::error::ParseError;

/// The failure headline, the source line it points into, and a caret under
/// the offending column.
pub fn readout(err: &ParseError<'_>) -> String {
    let (line, column) = err.line_and_column();
    let source = err
        .context()
        .cursor()
        .input()
        .lines()
        .nth(line - 1)
        .unwrap_or("");
    format!(
        "{err}\n{source}\n{caret:>column$}",
        caret = '^',
        column = column,
    )
}
