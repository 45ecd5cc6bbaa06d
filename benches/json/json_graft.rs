use graft::prelude::gf::Tree;
use graft::prelude::*;

/// Same shape as the JSON grammar in `demos/json.rs`, kept self-contained so
/// the bench builds without the example targets.
pub fn grammar() -> Rule {
    let value = Ahead::new();
    let ws = || Rule::char(' ').or('\t').or('\n').or('\r').times(0..);

    let digit = || Rule::range('0'..='9');
    let integer = maybe('-').then(Rule::char('0').or(Rule::range('1'..='9').then(some(digit()))));
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

    let plain = Rule::range('\u{20}'..='\u{10FFFF}').refusing(Rule::char('"').or('\\'));
    let escape = Rule::char('\\').then(Rule::range('\u{20}'..='\u{10FFFF}'));
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

pub fn graft_parser(rule: &Rule, s: &str) -> Tree {
    apply_tree(s, rule, &Options::exact()).expect("valid json")
}
