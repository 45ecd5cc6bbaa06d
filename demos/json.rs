//! A JSON consumer: grammar, parse tree, and a fold down to
//! `serde_json::Value` so the result can be checked against a reference
//! parser.
//!
//! cargo run --example json -- '{"a": [1, 2.5, "x"]}'
//!
//! RUST_LOG=graft=trace cargo test --example json -- --nocapture

use graft::prelude::gf::Tree;
use graft::prelude::*;

pub fn json_grammar() -> Rule {
    let value = Ahead::new();
    let ws = || {
        Rule::char(' ')
            .or('\t')
            .or('\n')
            .or('\r')
            .times(0..)
    };

    let digit = || Rule::range('0'..='9');
    let integer = maybe('-').then(
        Rule::char('0').or(Rule::range('1'..='9').then(some(digit()))),
    );
    let fraction = Rule::char('.').then(many(digit()));
    let exponent = Rule::char('e')
        .or('E')
        .then(maybe(Rule::char('+').or('-')))
        .then(many(digit()));
    let number = integer
        .then(maybe(fraction))
        .then(maybe(exponent))
        .keep("value")
        .capture("number");

    let hex = Rule::range('0'..='9')
        .or(Rule::range('a'..='f'))
        .or(Rule::range('A'..='F'));
    let escape = Rule::char('\\').then(
        Rule::char('"')
            .or('\\')
            .or('/')
            .or('b')
            .or('f')
            .or('n')
            .or('r')
            .or('t')
            .or(Rule::char('u').then(hex.times(4..=4))),
    );
    let plain = Rule::range('\u{20}'..='\u{10FFFF}').refusing(Rule::char('"').or('\\'));
    let string = Rule::char('"')
        .then(plain.or(escape).times(0..).keep("value"))
        .then('"')
        .capture("string");

    let pair = ws()
        .then(string.clone())
        .then(ws())
        .then(':')
        .then(value.rule())
        .capture("pair");
    let object = Rule::char('{')
        .then(maybe(sep(pair, ',')))
        .then(ws())
        .then('}')
        .capture("object");

    let array = Rule::char('[')
        .then(maybe(sep(value.rule(), ',')))
        .then(ws())
        .then(']')
        .capture("array");

    let literal = lit("true").or(lit("false")).or(lit("null"));

    value.put(
        ws().then(object.or(array).or(string).or(number).or(literal))
            .then(ws()),
    );
    value.rule()
}

/// root → its only child; number/string → primitive; object → the merged
/// map of its pair children; array → its children.
pub fn reduce(tree: &Tree) -> serde_json::Value {
    use serde_json::Value;
    tree.map(&mut |t, mut kids: Vec<Value>| match t.id() {
        "root" => kids.remove(0),
        "number" => {
            let text = t.attr("value");
            if text.contains(['.', 'e', 'E']) {
                Value::from(text.parse::<f64>().expect("float"))
            } else {
                Value::from(text.parse::<i64>().expect("integer"))
            }
        }
        "string" => Value::String(unescape(t.attr("value"))),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        "array" => Value::Array(kids),
        "object" => {
            let mut map = serde_json::Map::new();
            for kid in kids {
                match kid {
                    Value::Object(pair) => map.extend(pair),
                    other => unreachable!("object child {other}"),
                }
            }
            Value::Object(map)
        }
        "pair" => {
            let value = kids.pop().expect("pair value");
            let key = match kids.pop() {
                Some(Value::String(key)) => key,
                other => unreachable!("pair key {other:?}"),
            };
            let mut map = serde_json::Map::new();
            map.insert(key, value);
            Value::Object(map)
        }
        other => unreachable!("node {other}"),
    })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&code, 16).expect("hex escape");
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            Some(other) => out.push(other), // '"', '\\', '/'
            None => {}
        }
    }
    out
}

fn main() {
    env_logger::init();
    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| r#"{"crates": ["graft", "serde_json"], "stars": 7}"#.to_string());
    match apply(&input, &json_grammar(), &Options::exact()) {
        Ok(ctx) => {
            print!("{}", ctx.root().inspect());
            println!("{}", reduce(ctx.root()));
        }
        Err(e) => eprintln!("{}", gf::readout(&e)),
    }
}
