use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// An immutable labeled parse tree. `adopt`, `setattr` and `terminate`
/// return a new tree and leave the receiver untouched; children are
/// `Arc`-shared, so copies are cheap and trees may share sub-structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    id: Arc<str>,
    begin: usize,
    span: usize,
    children: Vec<Arc<Tree>>,
    attributes: BTreeMap<Arc<str>, String>,
}

// one step of a dig path: a child id or a child index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'s> {
    Id(&'s str),
    Nth(usize),
}

impl<'s> From<&'s str> for Step<'s> {
    fn from(id: &'s str) -> Self {
        Step::Id(id)
    }
}

impl From<usize> for Step<'_> {
    fn from(n: usize) -> Self {
        Step::Nth(n)
    }
}

impl Tree {
    pub fn new(id: impl Into<Arc<str>>, begin: usize) -> Tree {
        let id = id.into();
        assert!(!id.is_empty(), "tree id must be non-empty");
        Tree {
            id,
            begin,
            span: 0,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn end(&self) -> usize {
        self.begin + self.span
    }

    pub fn children(&self) -> &[Arc<Tree>] {
        &self.children
    }

    pub fn adopt(&self, child: Tree) -> Tree {
        let mut next = self.clone();
        next.children.push(Arc::new(child));
        next
    }

    pub fn setattr(&self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Tree {
        let mut next = self.clone();
        next.attributes.insert(name.into(), value.into());
        next
    }

    /// A copy whose span ends at character index `at`; panics unless
    /// `at > begin`.
    pub fn terminate(&self, at: usize) -> Tree {
        assert!(
            at > self.begin,
            "terminate at {at} on or before begin {begin} of '{id}'",
            begin = self.begin,
            id = self.id,
        );
        let mut next = self.clone();
        next.span = at - self.begin;
        next
    }

    // required form; panics when absent
    pub fn attr(&self, name: &str) -> &str {
        self.try_attr(name)
            .unwrap_or_else(|| panic!("no attribute '{name}' on '{id}'", id = self.id))
    }

    pub fn try_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    // required form; panics when the path does not exist
    pub fn dig<'s, I>(&self, steps: I) -> &Tree
    where
        I: IntoIterator,
        I::Item: Into<Step<'s>>,
    {
        let steps: Vec<Step<'s>> = steps.into_iter().map(Into::into).collect();
        self.try_dig(steps.iter().copied())
            .unwrap_or_else(|| panic!("no tree at {steps:?} under '{id}'", id = self.id))
    }

    pub fn try_dig<'s, I>(&self, steps: I) -> Option<&Tree>
    where
        I: IntoIterator,
        I::Item: Into<Step<'s>>,
    {
        let mut node = self;
        for step in steps {
            node = match step.into() {
                Step::Id(id) => node.children.iter().find(|c| c.id() == id)?,
                Step::Nth(n) => node.children.get(n)?,
            };
        }
        Some(node)
    }

    // bottom-up: f sees each node with its already-mapped children
    pub fn map<T, F>(&self, f: &mut F) -> T
    where
        F: FnMut(&Tree, Vec<T>) -> T,
    {
        let mut kids = Vec::with_capacity(self.children.len());
        for child in &self.children {
            kids.push(child.map(&mut *f));
        }
        f(self, kids)
    }

    /// Indented rendering: one `id ⸢begin-end⸥` header per node, followed
    /// by its `key="value"` attribute pairs.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, 0);
        out
    }

    fn render(&self, out: &mut String, depth: usize) {
        let _ = write!(
            out,
            "{:indent$}{id} ⸢{begin}-{end}⸥",
            "",
            indent = depth * 2,
            id = self.id,
            begin = self.begin,
            end = self.end(),
        );
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}={value:?}");
        }
        out.push('\n');
        for child in &self.children {
            child.render(out, depth + 1);
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
