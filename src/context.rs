use std::sync::Arc;

use crate::cursor::Cursor;
use crate::tree::Tree;

/// The value threaded through rule evaluation: a cursor paired with the
/// tree currently being accumulated. A failed rule never hands its context
/// back, the caller carries on with the one it already holds — that is the
/// whole backtracking story.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<'a> {
    cursor: Cursor<'a>,
    root: Tree,
}

impl<'a> Context<'a> {
    pub fn new(cursor: Cursor<'a>, root: Tree) -> Context<'a> {
        Context { cursor, root }
    }

    pub fn cursor(&self) -> Cursor<'a> {
        self.cursor
    }

    pub fn root(&self) -> &Tree {
        &self.root
    }

    pub fn into_root(self) -> Tree {
        self.root
    }

    #[inline]
    pub fn progress(&self) -> usize {
        self.cursor.position()
    }

    #[inline]
    pub fn char(&self) -> char {
        self.cursor.char()
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    pub fn rest(&self) -> &'a str {
        self.cursor.rest()
    }

    pub(crate) fn advance(&self) -> Context<'a> {
        Context {
            cursor: self.cursor.advance(),
            root: self.root.clone(),
        }
    }

    // same cursor, fresh root: the sub-tree a capture accumulates into
    pub fn rebase(&self, id: impl Into<Arc<str>>) -> Context<'a> {
        Context {
            cursor: self.cursor,
            root: Tree::new(id, self.cursor.position()),
        }
    }

    // a root that consumed nothing keeps its zero span
    pub fn terminate(&self) -> Context<'a> {
        if self.progress() > self.root.begin() {
            Context {
                cursor: self.cursor,
                root: self.root.terminate(self.progress()),
            }
        } else {
            self.clone()
        }
    }

    /// Incorporate a successful descendant: its root is closed and appended
    /// as the next child, and the cursor is whichever of the two got
    /// further. The progress-max rule is what carries forward motion out of
    /// the sub-evaluation.
    pub fn adopt(&self, sub: &Context<'a>) -> Context<'a> {
        Context {
            cursor: if sub.progress() > self.progress() {
                sub.cursor
            } else {
                self.cursor
            },
            root: self.root.adopt(sub.terminate().into_root()),
        }
    }
}
