//! Grammar of the debugger machine interface output.
//!
//! Every group of the grammar is lenient: when an item inside a tuple, list or
//! record tail does not match, the group ends at the last complete item. Callers
//! get a partial record rather than an error. A tuple or list without its closing
//! bracket cuts the record off there, the rest of the line is dropped.

use crate::mi::record::{
    AsyncKind, AsyncRecord, List, Record, ResultClass, ResultRecord, Results, StreamKind,
    StreamRecord, Token, Value,
};
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, just, none_of, one_of, recursive};
use chumsky::{extra, text, IterParser, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Parse a record from the start of the line.
/// Return the record and the part of the line that follows it.
pub fn parse_prefix(line: &str) -> Option<(Record, &str)> {
    record()
        .then(any().repeated().to_slice())
        .parse(line)
        .into_output()
}

/// Parse a single line of backend output. Return [`None`] for lines that are not
/// a part of the protocol (prompt, banners, etc.).
pub fn parse(line: &str) -> Option<Record> {
    parse_prefix(line).map(|(record, _)| record)
}

/// Parse a standalone value, like `{a="1",b=["2"]}`.
pub fn parse_value(input: &str) -> Option<Value> {
    value().parse(input).into_output()
}

fn token<'a>() -> impl Parser<'a, &'a str, Option<Token>, Err<'a>> + Clone {
    text::digits(10)
        .to_slice()
        .map(|digits: &str| digits.parse::<u64>().ok().map(Token))
        .or_not()
        .map(Option::flatten)
        .labelled("token")
}

/// Result name: letters, digits, `-` and `_`, never starts with a digit.
fn variable<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_' || *c == '-')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .repeated(),
        )
        .to_slice()
        .labelled("variable")
}

fn async_class<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("async class")
}

/// Double-quoted c-string, the content is returned without decoding escapes.
fn c_string<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    let escaped = just('\\').then(any()).ignored();
    let plain = none_of("\\\"").ignored();

    escaped
        .or(plain)
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .labelled("c-string")
}

/// One or more items separated by commas. Stops before the first comma that is
/// not followed by a well-formed item.
fn comma_separated<'a, T, P>(item: P) -> impl Parser<'a, &'a str, Vec<T>, Err<'a>> + Clone
where
    P: Parser<'a, &'a str, T, Err<'a>> + Clone,
{
    item.clone()
        .then(
            just(',')
                .ignore_then(item)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map(|(head, tail)| std::iter::once(head).chain(tail).collect())
}

/// Closing bracket of a tuple or list. If it is missing, the rest of the line is
/// consumed so that no enclosing group picks up items of a broken one.
fn closing<'a>(bracket: char) -> impl Parser<'a, &'a str, (), Err<'a>> + Clone {
    just(bracket).ignored().or(any().repeated())
}

fn value<'a>() -> impl Parser<'a, &'a str, Value, Err<'a>> + Clone {
    recursive(|value| {
        let result = variable()
            .then_ignore(just('='))
            .then(value.clone())
            .map(|(name, value): (&str, Value)| (name.to_string(), value));

        let constant = c_string().map(|s: &str| Value::Const(s.to_string()));

        let tuple = just('{')
            .ignore_then(comma_separated(result.clone()).or_not())
            .then_ignore(closing('}'))
            .map(|results| Value::Tuple(Results::from(results.unwrap_or_default())));

        // a list holds bare values if it starts like a value, otherwise results
        let bare_values = one_of("\"{[")
            .rewind()
            .ignore_then(comma_separated(value))
            .map(List::Values);
        let named_results =
            comma_separated(result).map(|results| List::Results(Results::from(results)));
        let list = just('[')
            .ignore_then(bare_values.or(named_results).or_not())
            .then_ignore(closing(']'))
            .map(|list| Value::List(list.unwrap_or(List::Empty)));

        choice((constant, tuple, list)).labelled("value")
    })
}

fn result<'a>() -> impl Parser<'a, &'a str, (String, Value), Err<'a>> + Clone {
    variable()
        .then_ignore(just('='))
        .then(value())
        .map(|(name, value): (&str, Value)| (name.to_string(), value))
        .labelled("result")
}

fn async_record<'a>() -> impl Parser<'a, &'a str, Record, Err<'a>> + Clone {
    let kind = choice((
        just('*').to(AsyncKind::Exec),
        just('+').to(AsyncKind::Status),
        just('=').to(AsyncKind::Notify),
    ));

    // async results may be wrapped in a loose `{...}` group
    let tail = just(',')
        .ignore_then(just('{').or_not())
        .ignore_then(result())
        .then_ignore(just('}').or_not())
        .repeated()
        .collect::<Vec<_>>();

    token()
        .then(kind)
        .then(async_class())
        .then(tail)
        .map(|(((token, kind), class), results)| {
            Record::Async(AsyncRecord {
                token,
                kind,
                class: class.to_string(),
                results: Results::from(results),
            })
        })
}

fn stream_record<'a>() -> impl Parser<'a, &'a str, Record, Err<'a>> + Clone {
    let kind = choice((
        just('~').to(StreamKind::Console),
        just('@').to(StreamKind::Target),
        just('&').to(StreamKind::Log),
    ));

    kind.then(c_string()).map(|(kind, content): (StreamKind, &str)| {
        Record::Stream(StreamRecord {
            token: None,
            kind,
            content: content.to_string(),
        })
    })
}

fn result_record<'a>() -> impl Parser<'a, &'a str, Record, Err<'a>> + Clone {
    let class = choice((
        just("done").to(ResultClass::Done),
        just("running").to(ResultClass::Running),
        just("connected").to(ResultClass::Connected),
        just("error").to(ResultClass::Error),
        just("exit").to(ResultClass::Exit),
    ));

    let tail = just(',').ignore_then(result()).repeated().collect::<Vec<_>>();

    token()
        .then_ignore(just('^'))
        .then(class)
        .then(tail)
        .map(|((token, class), results)| {
            Record::Result(ResultRecord {
                token,
                class,
                results: Results::from(results),
            })
        })
}

fn record<'a>() -> impl Parser<'a, &'a str, Record, Err<'a>> + Clone {
    // out-of-band records first, result record last
    choice((async_record(), stream_record(), result_record()))
}
