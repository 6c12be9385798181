//! The expression model: columns, comparisons, boolean groups, literals and orderings.

#[cfg(feature = "time")]
mod time;

use crate::compiler::Compiled;
use crate::error::Error;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How predicates on a column are evaluated.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ColumnKind {
    /// Evaluated by the relational engine.
    #[default]
    Relational,
    /// Pushed into the search engine's query.
    Search,
}

/// A column, together with its owning table and its kind.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Column {
    pub table: String,
    pub name: String,
    pub kind: ColumnKind,
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            kind,
        }
    }

    /// A search-indexed column.
    pub fn search(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, name, ColumnKind::Search)
    }

    /// A plain relational column.
    pub fn relational(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, name, ColumnKind::Relational)
    }

    pub fn is_search(&self) -> bool {
        self.kind == ColumnKind::Search
    }

    fn compare(&self, operator: Operator, value: Operand) -> Clause {
        Clause::Comparison(Comparison {
            column: self.clone(),
            operator,
            value,
        })
    }

    pub fn eq(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Eq, value.into())
    }

    pub fn ne(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Ne, value.into())
    }

    pub fn gt(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Gt, value.into())
    }

    pub fn gte(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Gte, value.into())
    }

    pub fn lt(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Lt, value.into())
    }

    pub fn lte(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Lte, value.into())
    }

    /// Full-text match (`:@`).
    pub fn matches(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Match, value.into())
    }

    /// Phrase match, or a regular expression match when given a [`Regex`].
    pub fn like(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::Like, value.into())
    }

    /// Inclusive range, rendered as `column:low /to/ high`.
    pub fn between(&self, low: impl Into<Literal>, high: impl Into<Literal>) -> Clause {
        self.compare(Operator::Between, Operand::List(vec![low.into(), high.into()]))
    }

    pub fn is_in<I, V>(&self, values: I) -> Clause
    where
        I: IntoIterator<Item = V>,
        V: Into<Literal>,
    {
        self.compare(
            Operator::In,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn is_not(&self, value: impl Into<Operand>) -> Clause {
        self.compare(Operator::IsNot, value.into())
    }

    pub fn asc(&self) -> Order {
        Order::Column {
            column: self.clone(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(&self) -> Order {
        Order::Column {
            column: self.clone(),
            direction: Direction::Descending,
        }
    }
}

/// A table which can be searched.
///
/// Usually implemented through `#[derive(Table)]`, which also generates one column accessor
/// per field.
pub trait Table {
    const NAME: &'static str;

    /// The clause declaring this table as the target of a search.
    fn declare() -> Clause {
        Clause::Literal(Literal::Table(Self::NAME.to_string()))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Match,
    Like,
    Between,
    In,
    IsNot,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Match => "MATCH",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::IsNot => "IS NOT",
        })
    }
}

/// A compiled regular expression, compared by its source.
#[derive(Clone, Debug)]
pub struct Pattern(pub Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|err| Error::InvalidParameter(err.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Pattern(Pattern),
    /// Pre-rendered search query text, passed through as-is.
    Raw(String),
    /// A quoted phrase.
    Phrase(String),
    /// Declares the table a search targets.
    Table(String),
    #[cfg(feature = "time")]
    DateTime(::time::OffsetDateTime),
}

impl Literal {
    /// A phrase, stripped of surrounding double quotes.
    pub fn phrase(phrase: impl AsRef<str>) -> Self {
        Self::Phrase(phrase.as_ref().trim_matches('"').to_string())
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// A short name of the kind of value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Pattern(_) => "pattern",
            Self::Raw(_) => "raw",
            Self::Phrase(_) => "phrase",
            Self::Table(_) => "table",
            #[cfg(feature = "time")]
            Self::DateTime(_) => "datetime",
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

macro_rules! from_integer {
    ($n:ty) => {
        impl From<$n> for Literal {
            fn from(value: $n) -> Self {
                Self::Integer(value.into())
            }
        }
    };
}

from_integer!(i8);
from_integer!(i16);
from_integer!(i32);
from_integer!(i64);
from_integer!(u8);
from_integer!(u16);
from_integer!(u32);

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Regex> for Literal {
    fn from(value: Regex) -> Self {
        Self::Pattern(Pattern(value))
    }
}

impl From<Pattern> for Literal {
    fn from(value: Pattern) -> Self {
        Self::Pattern(value)
    }
}

impl<T> From<Option<T>> for Literal
where
    T: Into<Literal>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// The right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(Literal),
    Column(Column),
    List(Vec<Literal>),
}

impl<T> From<T> for Operand
where
    T: Into<Literal>,
{
    fn from(value: T) -> Self {
        Self::Literal(value.into())
    }
}

impl From<Column> for Operand {
    fn from(value: Column) -> Self {
        Self::Column(value)
    }
}

impl From<&Column> for Operand {
    fn from(value: &Column) -> Self {
        Self::Column(value.clone())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub column: Column,
    pub operator: Operator,
    pub value: Operand,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn joiner(&self) -> &'static str {
        match self {
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub combinator: Combinator,
    pub children: Vec<Clause>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Comparison(Comparison),
    Group(Group),
    Literal(Literal),
    /// A bare column reference.
    Column(Column),
    /// A search clause which already went through the compiler.
    Compiled(Box<Compiled>),
}

impl Clause {
    /// A short name of the kind of clause, for error messages.
    pub fn kind(&self) -> String {
        match self {
            Self::Comparison(_) => "comparison".into(),
            Self::Group(Group {
                combinator: Combinator::And,
                ..
            }) => "and group".into(),
            Self::Group(Group {
                combinator: Combinator::Or,
                ..
            }) => "or group".into(),
            Self::Literal(literal) => format!("{} literal", literal.kind()),
            Self::Column(column) => format!("column {column}"),
            Self::Compiled(_) => "compiled search clause".into(),
        }
    }
}

impl From<Comparison> for Clause {
    fn from(value: Comparison) -> Self {
        Self::Comparison(value)
    }
}

impl From<Group> for Clause {
    fn from(value: Group) -> Self {
        Self::Group(value)
    }
}

impl From<Literal> for Clause {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<Compiled> for Clause {
    fn from(value: Compiled) -> Self {
        Self::Compiled(Box::new(value))
    }
}

pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Clause {
    Clause::Group(Group {
        combinator: Combinator::And,
        children: clauses.into_iter().collect(),
    })
}

pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Clause {
    Clause::Group(Group {
        combinator: Combinator::Or,
        children: clauses.into_iter().collect(),
    })
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Ascending),
            "desc" => Ok(Self::Descending),
            _ => Err(Error::InvalidParameter(format!(
                "Invalid direction '{s}', expected 'asc' or 'desc'"
            ))),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Order {
    Column {
        column: Column,
        direction: Direction,
    },
    /// Order by the search engine's relevance score.
    Score { direction: Direction },
}

impl Order {
    pub fn score(direction: Direction) -> Self {
        Self::Score { direction }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Self::Column { direction, .. } | Self::Score { direction } => *direction,
        }
    }

    /// Whether this order can only be honored by the search engine.
    pub fn is_search(&self) -> bool {
        match self {
            Self::Column { column, .. } => column.is_search(),
            Self::Score { .. } => true,
        }
    }
}
