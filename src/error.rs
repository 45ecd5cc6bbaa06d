use std::error::Error;
use std::fmt;

use crate::context::Context;
use crate::cursor::EOI;

/// A match failure: the normal, recoverable outcome of a rule that does not
/// apply. The wrapped context is the furthest state the failing rule
/// actually inspected.
#[derive(Debug, Clone)]
pub struct ParseError<'a> {
    context: Context<'a>,
}

impl<'a> ParseError<'a> {
    pub(crate) fn new(context: Context<'a>) -> Self {
        ParseError { context }
    }

    pub fn context(&self) -> &Context<'a> {
        &self.context
    }

    pub fn progress(&self) -> usize {
        self.context.progress()
    }

    pub fn char(&self) -> char {
        self.context.char()
    }

    pub fn line_and_column(&self) -> (usize, usize) {
        self.context.cursor().line_and_column()
    }

    pub fn to_syntax(&self) -> SyntaxError {
        let (line, column) = self.line_and_column();
        SyntaxError {
            progress: self.progress(),
            found: self.char(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.line_and_column();
        write!(
            f,
            "no match at line {line}, column {column}: found {found}",
            found = describe(self.char()),
        )
    }
}

impl Error for ParseError<'_> {}

// the final, unhandled failure of a parse, detached from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxError {
    pub progress: usize,
    pub found: char,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error at line {line}, column {column}: found {found}",
            line = self.line,
            column = self.column,
            found = describe(self.found),
        )
    }
}

impl Error for SyntaxError {}

fn describe(found: char) -> String {
    if found == EOI {
        "end of input".to_string()
    } else {
        format!("{found:?}")
    }
}
