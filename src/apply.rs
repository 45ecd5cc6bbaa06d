use std::sync::Arc;

use crate::context::Context;
use crate::cursor::Cursor;
use crate::error::{ParseError, SyntaxError};
use crate::rule::Rule;
use crate::tree::Tree;

#[derive(Debug, Clone)]
pub struct Options {
    // starting character index into the input
    pub offset: usize,
    // require the rule to consume the input to end-of-input
    pub exact: bool,
    // label of the implicit outermost tree
    pub root_id: Arc<str>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            offset: 0,
            exact: false,
            root_id: Arc::from("root"),
        }
    }
}

impl Options {
    pub fn exact() -> Options {
        Options {
            exact: true,
            ..Options::default()
        }
    }
}

/// Apply `rule` to `input` and return the final context with its root span
/// closed, or the error the evaluation ended in. With `opts.exact`, a match
/// that leaves input unconsumed becomes an error at the first leftover
/// character.
pub fn apply<'a>(
    input: &'a str,
    rule: &Rule,
    opts: &Options,
) -> Result<Context<'a>, ParseError<'a>> {
    let cursor = Cursor::at(input, opts.offset);
    let root = Tree::new(opts.root_id.clone(), cursor.position());
    let out = rule.evaluate(Context::new(cursor, root))?;
    if opts.exact && !out.at_end() {
        return Err(ParseError::new(out));
    }
    Ok(out.terminate())
}

// the root tree, or None on failure
pub fn apply_tree(input: &str, rule: &Rule, opts: &Options) -> Option<Tree> {
    apply(input, rule, opts).ok().map(Context::into_root)
}

// the root tree, or the unhandled failure as an owned SyntaxError
pub fn parse(input: &str, rule: &Rule, opts: &Options) -> Result<Tree, SyntaxError> {
    apply(input, rule, opts)
        .map(Context::into_root)
        .map_err(|e| e.to_syntax())
}
