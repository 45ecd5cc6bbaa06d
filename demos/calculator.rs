//! Integer arithmetic with precedence, folded straight off the parse tree.
//!
//! cargo run --example calculator -- "2 * (3 + 4)"
//!
//! RUST_LOG=graft=trace cargo test --example calculator -- --nocapture

use graft::prelude::gf::Tree;
use graft::prelude::*;

/// expr  = term  (('+'|'-') term)*
/// term  = factor (('*'|'/') factor)*
/// factor = number | '(' expr ')'
fn grammar() -> Rule {
    let expr = Ahead::new();
    let ws = || Rule::char(' ').times(0..);

    let digits = many(Rule::range('0'..='9'));
    let number = maybe('-').then(digits).keep("value").capture("number");

    let parens = Rule::char('(')
        .then(ws())
        .then(expr.rule())
        .then(ws())
        .then(')');
    let factor = number.or(parens);

    let mul_step = Rule::char('*')
        .or('/')
        .keep("op")
        .then(ws())
        .then(factor.clone())
        .capture("step");
    let term = factor.then(some(ws().then(mul_step))).capture("term");

    let add_step = Rule::char('+')
        .or('-')
        .keep("op")
        .then(ws())
        .then(term.clone())
        .capture("step");
    expr.put(
        ws().then(term)
            .then(some(ws().then(add_step)))
            .then(ws())
            .capture("expr"),
    );

    expr.rule()
}

enum Node {
    Num(i64),
    Step(char, i64),
}

impl Node {
    fn value(self) -> i64 {
        match self {
            Node::Num(n) => n,
            Node::Step(_, n) => n,
        }
    }
}

fn fold(kids: Vec<Node>) -> i64 {
    let mut kids = kids.into_iter();
    let mut acc = kids.next().expect("an operand").value();
    for step in kids {
        match step {
            Node::Step('+', n) => acc += n,
            Node::Step('-', n) => acc -= n,
            Node::Step('*', n) => acc *= n,
            Node::Step('/', n) => acc /= n,
            Node::Step(op, _) => unreachable!("operator {op:?}"),
            Node::Num(_) => unreachable!("two operands without an operator"),
        }
    }
    acc
}

fn reduce(tree: &Tree) -> i64 {
    tree.map(&mut |t, kids: Vec<Node>| match t.id() {
        "number" => Node::Num(t.attr("value").parse().expect("integer")),
        "step" => Node::Step(
            t.attr("op").chars().next().expect("operator"),
            fold(kids),
        ),
        _ => Node::Num(fold(kids)),
    })
    .value()
}

fn eval(input: &str) -> Result<i64, String> {
    match apply(input, &grammar(), &Options::exact()) {
        Ok(ctx) => Ok(reduce(ctx.root())),
        Err(e) => Err(gf::readout(&e)),
    }
}

fn main() {
    env_logger::init();
    let input = std::env::args().nth(1).unwrap_or_else(|| "2 * (3 + 4)".to_string());
    match eval(&input) {
        Ok(n) => println!("{input} = {n}"),
        Err(report) => eprintln!("{report}"),
    }
}
