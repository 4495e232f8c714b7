use crate::varobj::handle::DisplayFormat;
use anyhow::anyhow;
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, Boxed, Parser};
use itertools::Itertools;
use std::str::FromStr;

pub const VAR_COMMAND: &str = "var";
pub const CHILDREN_COMMAND: &str = "children";
pub const FORMAT_COMMAND: &str = "format";
pub const ASSIGN_COMMAND: &str = "assign";
pub const UPDATE_COMMAND: &str = "update";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const MI_COMMAND_PREFIX: char = '-';

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Console input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Raw machine interface command, sent as is.
    Mi(String),
    CreateVar { name: String, expression: String },
    Children(String),
    SetFormat { name: String, format: DisplayFormat },
    Assign { name: String, expression: String },
    Update,
    Help,
    SkipInput,
}

fn separator<'a>() -> impl Parser<'a, &'a str, (), Err<'a>> + Clone {
    any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored()
}

/// Keyword followed by at least one space.
fn keyword<'a>(kw: &'static str) -> impl Parser<'a, &'a str, (), Err<'a>> + Clone {
    just(kw).then(separator()).ignored()
}

fn word<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    any()
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("variable object name")
}

fn rest<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    any()
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| s.trim().to_string())
        .labelled("expression")
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse console input into command.
    pub fn parse(input: &str) -> anyhow::Result<Command> {
        Self::parser()
            .parse(input.trim())
            .into_result()
            .map_err(|errors| anyhow!("{}", errors.iter().join("; ")))
    }

    fn parser<'a>() -> impl Parser<'a, &'a str, Command, Err<'a>> {
        let mi = just(MI_COMMAND_PREFIX)
            .then(any().repeated())
            .to_slice()
            .map(|text: &str| Command::Mi(text.to_string()));

        let create_var = keyword(VAR_COMMAND)
            .ignore_then(word())
            .then_ignore(separator())
            .then(rest())
            .map(|(name, expression)| Command::CreateVar {
                name: name.to_string(),
                expression,
            });

        let children = keyword(CHILDREN_COMMAND)
            .ignore_then(word())
            .map(|name| Command::Children(name.to_string()));

        let format = keyword(FORMAT_COMMAND)
            .ignore_then(word())
            .then_ignore(separator())
            .then(word().try_map(|fmt: &str, span| {
                DisplayFormat::from_str(fmt)
                    .map_err(|_| Rich::custom(span, format!("unknown display format `{fmt}`")))
            }))
            .map(|(name, format)| Command::SetFormat {
                name: name.to_string(),
                format,
            });

        let assign = keyword(ASSIGN_COMMAND)
            .ignore_then(word())
            .then_ignore(separator())
            .then(rest())
            .map(|(name, expression)| Command::Assign {
                name: name.to_string(),
                expression,
            });

        let update = just(UPDATE_COMMAND).to(Command::Update);

        let help = just(HELP_COMMAND)
            .or(just(HELP_COMMAND_SHORT))
            .to(Command::Help);

        choice((
            command("mi", mi),
            command(VAR_COMMAND, create_var),
            command(CHILDREN_COMMAND, children),
            command(FORMAT_COMMAND, format),
            command(ASSIGN_COMMAND, assign),
            command(UPDATE_COMMAND, update),
            command(HELP_COMMAND, help),
            end().to(Command::SkipInput).boxed(),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "type help for list of commands")
            } else {
                e
            }
        })
    }
}
