#![warn(clippy::all)]
#![warn(clippy::correctness)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]

use std::cell::RefCell;

mod apply;
mod context;
mod cursor;
mod error;
mod logging;
mod render;
mod rule;
mod shorthand;
mod tree;
mod util;

pub mod prelude;

pub use apply::{apply, apply_tree, parse, Options};
pub use context::Context;
pub use cursor::{Cursor, EOI};
pub use error::{ParseError, SyntaxError};
pub use render::readout;
pub use rule::{tourney, Ahead, Rule};
pub use shorthand::{lit, many, maybe, sep, some};
pub use tree::{Step, Tree};

pub(crate) const LOG_TARGET: &str = "graft"; // env!("CARGO_PKG_NAME");

// innermost capture id, shown in trace output
thread_local!(pub(crate) static LABEL: RefCell<String> = RefCell::new(String::new()));
