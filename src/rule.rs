use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use log::log_enabled;
use log::Level::Trace;
use once_cell::sync::OnceCell;

use crate::context::Context;
use crate::error::ParseError;
use crate::logging::Loggable;
use crate::{LABEL, LOG_TARGET};

/// A composable grammar fragment. Evaluation is a backtracking top-down
/// walk threading a [`Context`] value; a rule holds no evaluation state, so
/// one rule value can serve any number of parses.
#[derive(Clone)]
pub enum Rule {
    Empty,
    // a single-character rule is the degenerate range c..=c; never matches
    // at end of input
    Range { lo: Bound<char>, hi: Bound<char> },
    Chain(Vec<Rule>),
    // seq mode returns the first success; tourney mode races every arm from
    // the same start and keeps whichever result got furthest
    Branch { arms: Vec<Rule>, tourney: bool },
    // max of None is unbounded
    Repeat {
        body: Box<Rule>,
        min: usize,
        max: Option<usize>,
    },
    // negative lookahead: fails where cond matches, otherwise body
    Refuse { body: Box<Rule>, cond: Box<Rule> },
    Capture { body: Box<Rule>, id: Arc<str> },
    Keep { body: Box<Rule>, id: Arc<str> },
    Ahead(Arc<OnceCell<Rule>>),
}

impl Rule {
    pub fn empty() -> Rule {
        Rule::Empty
    }

    pub fn char(c: char) -> Rule {
        Rule::range(c..=c)
    }

    // code-point order; 'a'..='z' and the exclusive 'a'..'z' both work
    pub fn range(r: impl RangeBounds<char>) -> Rule {
        Rule::Range {
            lo: r.start_bound().cloned(),
            hi: r.end_bound().cloned(),
        }
    }

    pub fn text(s: &str) -> Rule {
        let mut parts: Vec<Rule> = s.chars().map(Rule::char).collect();
        match parts.len() {
            0 => Rule::Empty,
            1 => parts.pop().unwrap(),
            _ => Rule::Chain(parts),
        }
    }

    pub fn then(self, next: impl Into<Rule>) -> Rule {
        match self {
            Rule::Chain(mut parts) => {
                parts.push(next.into());
                Rule::Chain(parts)
            }
            first => Rule::Chain(vec![first, next.into()]),
        }
    }

    pub fn or(self, alt: impl Into<Rule>) -> Rule {
        match self {
            Rule::Branch {
                mut arms,
                tourney: false,
            } => {
                arms.push(alt.into());
                Rule::Branch {
                    arms,
                    tourney: false,
                }
            }
            first => Rule::Branch {
                arms: vec![first, alt.into()],
                tourney: false,
            },
        }
    }

    pub fn times(self, reps: impl RangeBounds<usize>) -> Rule {
        let min = match reps.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let max = match reps.end_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n.saturating_sub(1)),
            Bound::Unbounded => None,
        };
        debug_assert!(max.map_or(true, |m| min <= m), "empty repetition range");
        Rule::Repeat {
            body: Box::new(self),
            min,
            max,
        }
    }

    // cond never consumes input in the enclosing context
    pub fn refusing(self, cond: impl Into<Rule>) -> Rule {
        Rule::Refuse {
            body: Box::new(self),
            cond: Box::new(cond.into()),
        }
    }

    pub fn capture(self, id: impl Into<Arc<str>>) -> Rule {
        Rule::Capture {
            body: Box::new(self),
            id: id.into(),
        }
    }

    pub fn keep(self, id: impl Into<Arc<str>>) -> Rule {
        Rule::Keep {
            body: Box::new(self),
            id: id.into(),
        }
    }

    /// An advanced context on a match, otherwise a [`ParseError`] carrying
    /// the furthest context actually inspected.
    pub fn evaluate<'a>(&self, ctx: Context<'a>) -> Result<Context<'a>, ParseError<'a>> {
        ctx.log_attempt(self);
        let out = self.eval(ctx);
        match &out {
            Ok(next) => next.log_success(self),
            Err(e) => e.context().log_failure(self),
        }
        out
    }

    fn eval<'a>(&self, ctx: Context<'a>) -> Result<Context<'a>, ParseError<'a>> {
        match self {
            Rule::Empty => Ok(ctx),

            Rule::Range { lo, hi } => {
                if !ctx.at_end() && (*lo, *hi).contains(&ctx.char()) {
                    Ok(ctx.advance())
                } else {
                    Err(ParseError::new(ctx))
                }
            }

            Rule::Chain(parts) => parts.iter().try_fold(ctx, |cur, part| part.evaluate(cur)),

            Rule::Branch {
                arms,
                tourney: false,
            } => {
                let mut furthest: Option<ParseError<'a>> = None;
                for arm in arms {
                    match arm.evaluate(ctx.clone()) {
                        Ok(next) => return Ok(next),
                        Err(e) => {
                            if furthest.as_ref().map_or(true, |f| e.progress() > f.progress()) {
                                furthest = Some(e);
                            }
                        }
                    }
                }
                Err(furthest.unwrap_or_else(|| ParseError::new(ctx)))
            }

            Rule::Branch {
                arms,
                tourney: true,
            } => {
                let mut best: Option<Result<Context<'a>, ParseError<'a>>> = None;
                for arm in arms {
                    let outcome = arm.evaluate(ctx.clone());
                    best = Some(match best {
                        None => outcome,
                        Some(held) => pick(held, outcome),
                    });
                }
                best.unwrap_or_else(|| Err(ParseError::new(ctx)))
            }

            Rule::Repeat { body, min, max } => {
                let mut cur = ctx;
                let mut done = 0usize;
                loop {
                    if *max == Some(done) {
                        return Ok(cur);
                    }
                    match body.evaluate(cur.clone()) {
                        Ok(next) => {
                            let advanced = next.progress() > cur.progress();
                            cur = next;
                            done += 1;
                            // a zero-advance success would repeat forever;
                            // stop silently and keep what we have
                            if !advanced {
                                return Ok(cur);
                            }
                        }
                        Err(_) if done >= *min => return Ok(cur),
                        Err(e) => return Err(e),
                    }
                }
            }

            Rule::Refuse { body, cond } => match cond.evaluate(ctx.clone()) {
                Ok(hit) => Err(ParseError::new(hit)),
                Err(_) => body.evaluate(ctx),
            },

            Rule::Capture { body, id } => {
                let prev = label_swap(id);
                let out = body.evaluate(ctx.rebase(id.clone()));
                label_restore(prev);
                Ok(ctx.adopt(&out?))
            }

            Rule::Keep { body, id } => {
                let sub = body.evaluate(ctx.rebase(id.clone()))?;
                let matched = ctx.cursor().slice_to(&sub.cursor());
                Ok(Context::new(
                    sub.cursor(),
                    ctx.root().setattr(id.clone(), matched),
                ))
            }

            Rule::Ahead(cell) => cell
                .get()
                .unwrap_or_else(|| panic!("ahead rule evaluated before put()"))
                .evaluate(ctx),
        }
    }
}

// the furthest result wins; a success beats an error at equal progress; the
// earlier result wins otherwise
fn pick<'a>(
    held: Result<Context<'a>, ParseError<'a>>,
    challenger: Result<Context<'a>, ParseError<'a>>,
) -> Result<Context<'a>, ParseError<'a>> {
    let hp = progress_of(&held);
    let cp = progress_of(&challenger);
    if cp > hp || (cp == hp && challenger.is_ok() && held.is_err()) {
        challenger
    } else {
        held
    }
}

fn progress_of(outcome: &Result<Context<'_>, ParseError<'_>>) -> usize {
    match outcome {
        Ok(ctx) => ctx.progress(),
        Err(e) => e.progress(),
    }
}

fn label_swap(id: &str) -> Option<String> {
    if log_enabled!(target: LOG_TARGET, Trace) {
        Some(LABEL.with(|l| l.replace(id.to_string())))
    } else {
        None
    }
}

fn label_restore(prev: Option<String>) {
    if let Some(prev) = prev {
        LABEL.with(|l| *l.borrow_mut() = prev);
    }
}

/// Pick whichever of `arms` gets furthest through the input, rather than
/// the first that succeeds.
pub fn tourney<I>(arms: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    Rule::Branch {
        arms: arms.into_iter().map(Into::into).collect(),
        tourney: true,
    }
}

/// A forward declaration, for recursive grammars: created empty,
/// [`put`](Ahead::put) binds the target exactly once, and evaluating an
/// unbound ahead panics.
#[derive(Clone, Debug, Default)]
pub struct Ahead {
    cell: Arc<OnceCell<Rule>>,
}

impl Ahead {
    pub fn new() -> Ahead {
        Ahead::default()
    }

    pub fn put(&self, rule: impl Into<Rule>) {
        if self.cell.set(rule.into()).is_err() {
            panic!("ahead rule bound twice");
        }
    }

    pub fn rule(&self) -> Rule {
        Rule::Ahead(self.cell.clone())
    }
}

impl From<char> for Rule {
    fn from(c: char) -> Rule {
        Rule::char(c)
    }
}

impl From<&str> for Rule {
    fn from(s: &str) -> Rule {
        Rule::text(s)
    }
}

impl From<std::ops::Range<char>> for Rule {
    fn from(r: std::ops::Range<char>) -> Rule {
        Rule::range(r)
    }
}

impl From<std::ops::RangeInclusive<char>> for Rule {
    fn from(r: std::ops::RangeInclusive<char>) -> Rule {
        Rule::range(r)
    }
}

impl From<&Ahead> for Rule {
    fn from(ahead: &Ahead) -> Rule {
        ahead.rule()
    }
}

impl From<Ahead> for Rule {
    fn from(ahead: Ahead) -> Rule {
        ahead.rule()
    }
}

// shallow on purpose: rules recurse and aheads can be cyclic
impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Empty => write!(f, "empty"),
            Rule::Range {
                lo: Bound::Included(a),
                hi: Bound::Included(b),
            } if a == b => write!(f, "char({a:?})"),
            Rule::Range { lo, hi } => write!(f, "range({lo:?}, {hi:?})"),
            Rule::Chain(parts) => write!(f, "chain[{}]", parts.len()),
            Rule::Branch {
                arms,
                tourney: false,
            } => write!(f, "or[{}]", arms.len()),
            Rule::Branch {
                arms,
                tourney: true,
            } => write!(f, "tourney[{}]", arms.len()),
            Rule::Repeat { min, max, .. } => match max {
                Some(max) => write!(f, "times({min}..={max})"),
                None => write!(f, "times({min}..)"),
            },
            Rule::Refuse { .. } => write!(f, "refuse"),
            Rule::Capture { id, .. } => write!(f, "capture({id})"),
            Rule::Keep { id, .. } => write!(f, "keep({id})"),
            Rule::Ahead(cell) => match cell.get() {
                Some(_) => write!(f, "ahead"),
                None => write!(f, "ahead(unbound)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{tourney, Ahead, Rule};
    use crate::context::Context;
    use crate::cursor::Cursor;
    use crate::error::ParseError;
    use crate::tree::Tree;
    use test_log::test;

    fn ctx(input: &str) -> Context<'_> {
        Context::new(Cursor::from(input), Tree::new("root", 0))
    }

    fn ok_at(outcome: Result<Context<'_>, ParseError<'_>>, progress: usize) {
        assert_eq!(outcome.expect("expected a match").progress(), progress);
    }

    fn err_at(outcome: Result<Context<'_>, ParseError<'_>>, progress: usize) {
        assert_eq!(outcome.expect_err("expected no match").progress(), progress);
    }

    #[test]
    fn test_empty_always_succeeds_in_place() {
        ok_at(Rule::empty().evaluate(ctx("")), 0);
        ok_at(Rule::empty().evaluate(ctx("abc")), 0);
    }

    #[test]
    fn test_char_and_range() {
        ok_at(Rule::char('x').evaluate(ctx("xy")), 1);
        err_at(Rule::char('x').evaluate(ctx("yx")), 0);
        err_at(Rule::char('x').evaluate(ctx("")), 0);

        ok_at(Rule::range('a'..='f').evaluate(ctx("f")), 1);
        // exclusive upper bound
        err_at(Rule::range('a'..'f').evaluate(ctx("f")), 0);
        ok_at(Rule::range('a'..'f').evaluate(ctx("e")), 1);
    }

    #[test]
    fn test_end_of_input_sentinel_matches_no_rule() {
        // EOI is reported as '\0', but even a rule for '\0' must not match
        // past the input
        err_at(Rule::char('\0').evaluate(ctx("")), 0);
        ok_at(Rule::char('\0').evaluate(ctx("\0")), 1);
    }

    #[test]
    fn test_chain_short_circuits_without_backtracking() {
        let rule = Rule::text("abc");
        ok_at(rule.evaluate(ctx("abcd")), 3);
        // first error is returned verbatim, furthest point inspected
        err_at(rule.evaluate(ctx("abx")), 2);
        err_at(rule.evaluate(ctx("x")), 0);
    }

    #[test]
    fn test_chain_of_one_is_the_rule_itself() {
        let plain = Rule::char('q');
        let chained = Rule::Chain(vec![Rule::char('q')]);
        assert_eq!(
            plain.evaluate(ctx("q")).unwrap(),
            chained.evaluate(ctx("q")).unwrap()
        );
        assert_eq!(
            plain.evaluate(ctx("z")).unwrap_err().progress(),
            chained.evaluate(ctx("z")).unwrap_err().progress()
        );
    }

    #[test]
    fn test_then_appends_to_an_existing_chain() {
        let rule = Rule::char('a').then('b').then('c');
        match &rule {
            Rule::Chain(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected a chain, got {other:?}"),
        }
        ok_at(rule.evaluate(ctx("abc")), 3);
    }

    #[test]
    fn test_or_takes_first_success() {
        let rule = Rule::text("ab").or("a");
        ok_at(rule.evaluate(ctx("ab")), 2);
        ok_at(rule.evaluate(ctx("ax")), 1);

        // declaration order, not longest match
        let rule = Rule::text("a").or("ab");
        ok_at(rule.evaluate(ctx("ab")), 1);
    }

    #[test]
    fn test_or_failure_surfaces_furthest_error() {
        let rule = Rule::text("ab").or("axyz").or("q");
        err_at(rule.evaluate(ctx("axq")), 2);
    }

    #[test]
    fn test_or_appends_to_an_existing_seq_branch() {
        let rule = Rule::char('a').or('b').or('c');
        match &rule {
            Rule::Branch { arms, tourney } => {
                assert_eq!(arms.len(), 3);
                assert!(!tourney);
            }
            other => panic!("expected a branch, got {other:?}"),
        }
    }

    #[test]
    fn test_tourney_prefers_furthest_progress() {
        let x = Rule::text("xxx").capture("x");
        let y = Rule::text("xxxy").capture("y");

        let winner = tourney([x.clone(), y.clone()])
            .evaluate(ctx("xxxy"))
            .unwrap();
        assert_eq!(winner.root().dig([0usize]).id(), "y");

        let winner = tourney([x, y]).evaluate(ctx("xxx")).unwrap();
        assert_eq!(winner.root().dig([0usize]).id(), "x");
    }

    #[test]
    fn test_tourney_four_way() {
        let arms = || {
            [
                Rule::text("x").capture("a"),
                Rule::text("xx").capture("b"),
                Rule::text("xxx").capture("c"),
                Rule::text("xxxx").capture("d"),
            ]
        };
        for (input, id) in [("x", "a"), ("xx", "b"), ("xxx", "c"), ("xxxx", "d")] {
            let won = tourney(arms()).evaluate(ctx(input)).unwrap();
            assert_eq!(won.root().dig([0usize]).id(), id, "input {input}");
            assert_eq!(won.progress(), input.len());
        }
    }

    #[test]
    fn test_tourney_success_beats_error_at_equal_progress() {
        // both reach position 2; the success wins even though the error
        // comes first
        let failing = Rule::text("abz");
        let matching = Rule::text("ab");
        ok_at(tourney([failing, matching]).evaluate(ctx("abc")), 2);
    }

    #[test]
    fn test_tourney_with_no_success_returns_furthest_error() {
        let rule = tourney([Rule::text("ab"), Rule::text("axy"), Rule::text("q")]);
        err_at(rule.evaluate(ctx("axq")), 2);
    }

    #[test]
    fn test_times_bounds() {
        let a = || Rule::char('a');
        ok_at(a().times(0..).evaluate(ctx("aaab")), 3);
        ok_at(a().times(0..).evaluate(ctx("b")), 0);
        ok_at(a().times(2..=2).evaluate(ctx("aaa")), 2);
        // exclusive upper bound stops one short
        ok_at(a().times(0..3).evaluate(ctx("aaaa")), 2);
        ok_at(a().times(0..=1).evaluate(ctx("aaa")), 1);
        // below the minimum the body's error propagates
        err_at(a().times(2..).evaluate(ctx("ab")), 1);
        err_at(a().times(1..).evaluate(ctx("b")), 0);
    }

    #[test]
    fn test_times_zero_advance_body_stops() {
        // an unbounded repeat over a zero-width success must not livelock
        ok_at(Rule::empty().times(0..).evaluate(ctx("aaa")), 0);
        ok_at(Rule::char('a').times(0..=0).evaluate(ctx("aaa")), 0);
    }

    #[test]
    fn test_refusing_is_negative_lookahead() {
        let ident = Rule::range('a'..='z').times(1..);
        let keyword = Rule::text("let");
        let rule = ident.refusing(keyword.then(' '));

        ok_at(rule.evaluate(ctx("letter")), 6);
        err_at(rule.evaluate(ctx("let x")), 4);

        // the condition consumed nothing from the enclosing context
        let lookahead = Rule::char('z').refusing("ab");
        err_at(lookahead.evaluate(ctx("abz")), 2);
        ok_at(Rule::char('a').refusing("zz").evaluate(ctx("ab")), 1);
    }

    #[test]
    fn test_capture_adopts_labeled_subtree() {
        let rule = Rule::text("hi").capture("greeting");
        let done = rule.evaluate(ctx("hi there")).unwrap();

        assert_eq!(done.progress(), 2);
        let child = done.root().dig(["greeting"]);
        assert_eq!(child.begin(), 0);
        assert_eq!(child.end(), 2);
    }

    #[test]
    fn test_capture_success_mirrors_body_on_rebased_context() {
        let body = Rule::text("ab");
        let base = ctx("abc");

        let direct = body.evaluate(base.rebase("z")).unwrap();
        let captured = body.capture("z").evaluate(base).unwrap();
        assert_eq!(captured.progress(), direct.progress());
    }

    #[test]
    fn test_failed_capture_leaves_no_trace() {
        let rule = Rule::text("ab").capture("pair").or(Rule::text("ax").capture("other"));
        let done = rule.evaluate(ctx("ax")).unwrap();
        assert_eq!(done.root().children().len(), 1);
        assert_eq!(done.root().dig([0usize]).id(), "other");
    }

    #[test]
    fn test_nested_captures_stay_within_parent_span() {
        let inner = Rule::char('b').capture("inner");
        let outer = Rule::char('a').then(inner).then('c').capture("outer");
        let done = outer.evaluate(ctx("abc")).unwrap().terminate();

        let root = done.root();
        let outer = root.dig(["outer"]);
        let inner = outer.dig(["inner"]);
        assert!(root.begin() <= outer.begin());
        assert!(outer.end() <= root.end());
        assert!(outer.begin() <= inner.begin());
        assert!(inner.end() <= outer.end());
    }

    #[test]
    fn test_keep_records_matched_substring() {
        let digits = Rule::range('0'..='9').times(1..);
        let rule = digits.keep("amount");
        let done = rule.evaluate(ctx("405 units")).unwrap();

        assert_eq!(done.progress(), 3);
        assert_eq!(done.root().attr("amount"), "405");
        // the sub-tree is discarded, only the attribute remains
        assert!(done.root().children().is_empty());
    }

    #[test]
    fn test_keep_progress_equals_body_progress() {
        let body = Rule::text("ab");
        let plain = body.evaluate(ctx("abc")).unwrap();
        let kept = Rule::text("ab").keep("k").evaluate(ctx("abc")).unwrap();
        assert_eq!(plain.progress(), kept.progress());
    }

    #[test]
    fn test_keep_counts_characters_not_bytes() {
        let any = Rule::range('\u{20}'..='\u{10FFFF}');
        let rule = any.times(2..=2).keep("pair");
        let done = rule.evaluate(ctx("👋🦊!")).unwrap();
        assert_eq!(done.progress(), 2);
        assert_eq!(done.root().attr("pair"), "👋🦊");
    }

    #[test]
    fn test_error_progress_never_regresses() {
        let rules = [
            Rule::char('z'),
            Rule::text("abq"),
            Rule::text("ab").or("aq"),
            Rule::char('a').times(9..),
            Rule::char('z').refusing("a"),
            Rule::text("abq").capture("c"),
            Rule::text("abq").keep("k"),
        ];
        let base = ctx("abc").advance();
        for rule in rules {
            let e = rule.evaluate(base.clone()).unwrap_err();
            assert!(
                e.progress() >= base.progress(),
                "{rule:?} regressed to {}",
                e.progress()
            );
        }
    }

    #[test]
    fn test_ahead_enables_recursion() {
        // nested parentheses: pair = '(' pair? ')'
        let pair = Ahead::new();
        pair.put(Rule::char('(').then(pair.rule().times(0..=1)).then(')'));

        let rule = pair.rule();
        ok_at(rule.evaluate(ctx("()")), 2);
        ok_at(rule.evaluate(ctx("((()))")), 6);
        // the repeat swallows the deeper failure; the chain reports the
        // unmatched ')' where it stopped
        err_at(rule.evaluate(ctx("((")), 1);
    }

    #[test]
    #[should_panic(expected = "before put")]
    fn test_unbound_ahead_is_fatal() {
        let _ = Ahead::new().rule().evaluate(ctx("x"));
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn test_rebinding_an_ahead_is_fatal() {
        let ahead = Ahead::new();
        ahead.put('a');
        ahead.put('b');
    }

    #[test]
    fn test_rules_evaluate_the_same_twice() {
        let rule = Rule::text("ab").capture("x").then(Rule::char('c').keep("y"));
        let first = rule.evaluate(ctx("abc")).unwrap();
        let second = rule.evaluate(ctx("abc")).unwrap();
        assert_eq!(first.root(), second.root());
        assert_eq!(first.progress(), second.progress());
    }
}
