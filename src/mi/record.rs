use itertools::Itertools;
use std::fmt::{Display, Formatter};
use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};

/// Number that correlates an issued command with its result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub u64);

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome tag of a result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncKind {
    /// `*` - execution state changes.
    Exec,
    /// `+` - progress of long running operations.
    Status,
    /// `=` - supplementary information.
    Notify,
}

impl AsyncKind {
    pub fn sigil(self) -> char {
        match self {
            AsyncKind::Exec => '*',
            AsyncKind::Status => '+',
            AsyncKind::Notify => '=',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// `~` - textual response to a CLI command.
    Console,
    /// `@` - output of the running program.
    Target,
    /// `&` - debugger internal messages.
    Log,
}

impl StreamKind {
    pub fn sigil(self) -> char {
        match self {
            StreamKind::Console => '~',
            StreamKind::Target => '@',
            StreamKind::Log => '&',
        }
    }
}

/// Ordered `name = value` pairs. Names may repeat, order is kept as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results(Vec<(String, Value)>);

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return first value with given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Return first value with given name if it is a constant.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_const)
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.0.push((name.into(), value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, Value)>> for Results {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self(pairs)
    }
}

impl Display for Results {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .join(",");
        f.write_str(&rendered)
    }
}

/// Body of a `[...]` group. Both shapes share the same bracket syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum List {
    Empty,
    Values(Vec<Value>),
    Results(Results),
}

impl List {
    /// Iterate over list items, names of a result list are dropped.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            List::Empty => Box::new(std::iter::empty()),
            List::Values(values) => Box::new(values.iter()),
            List::Results(results) => Box::new(results.iter().map(|(_, v)| v)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            List::Empty => 0,
            List::Values(values) => values.len(),
            List::Results(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Content of a c-string literal, escape sequences are kept as is.
    Const(String),
    Tuple(Results),
    List(List),
}

impl Value {
    pub fn as_const(&self) -> Option<&str> {
        match self {
            Value::Const(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Results> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Const(s) => write!(f, "\"{s}\""),
            Value::Tuple(results) => write!(f, "{{{results}}}"),
            Value::List(List::Empty) => f.write_str("[]"),
            Value::List(List::Values(values)) => {
                write!(f, "[{}]", values.iter().join(","))
            }
            Value::List(List::Results(results)) => write!(f, "[{results}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub token: Option<Token>,
    pub class: ResultClass,
    pub results: Results,
}

impl ResultRecord {
    /// Backend message of an `^error` record.
    pub fn message(&self) -> Option<&str> {
        self.results.get_str("msg")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsyncRecord {
    pub token: Option<Token>,
    pub kind: AsyncKind,
    /// Open-ended class tag, like `stopped` or `download`.
    pub class: String,
    pub results: Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    pub token: Option<Token>,
    pub kind: StreamKind,
    /// Raw c-string content, escapes are not decoded.
    pub content: String,
}

/// One parsed line of backend output.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Result(ResultRecord),
    Async(AsyncRecord),
    Stream(StreamRecord),
}

impl Record {
    pub fn token(&self) -> Option<Token> {
        match self {
            Record::Result(r) => r.token,
            Record::Async(r) => r.token,
            Record::Stream(r) => r.token,
        }
    }
}

fn write_token(f: &mut Formatter<'_>, token: Option<Token>) -> std::fmt::Result {
    match token {
        Some(t) => write!(f, "{t}"),
        None => Ok(()),
    }
}

fn write_results(f: &mut Formatter<'_>, results: &Results) -> std::fmt::Result {
    if results.is_empty() {
        Ok(())
    } else {
        write!(f, ",{results}")
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::Result(r) => {
                write_token(f, r.token)?;
                let class: &'static str = r.class.into();
                write!(f, "^{class}")?;
                write_results(f, &r.results)
            }
            Record::Async(r) => {
                write_token(f, r.token)?;
                write!(f, "{}{}", r.kind.sigil(), r.class)?;
                write_results(f, &r.results)
            }
            Record::Stream(r) => write!(f, "{}\"{}\"", r.kind.sigil(), r.content),
        }
    }
}
