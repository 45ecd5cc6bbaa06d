pub use crate::apply::{apply, apply_tree, parse, Options};
pub use crate::rule::{tourney, Ahead, Rule};
pub use crate::shorthand::{lit, many, maybe, sep, some};

pub mod gf {
    pub use crate::context::Context;
    pub use crate::cursor::{Cursor, EOI};
    pub use crate::error::{ParseError, SyntaxError};
    pub use crate::render::readout;
    pub use crate::tree::{Step, Tree};
}
