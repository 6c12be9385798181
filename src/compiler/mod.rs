//! Compilation of clauses into a ZomboDB search predicate.
//!
//! The result of a compilation is a [`Compiled`] value, which renders (through [`Display`]) into
//! the SQL predicate:
//!
//! ```text
//! zdb('<table>', ctid) ==> '<query>'
//! ```
//!
//! Values which only exist at execution time (other columns) can't be part of the query literal.
//! They are rendered as placeholders, and the predicate switches to
//! `format('<query>', <arg>, ...)` instead.

mod escape;

pub use escape::{escape, format_float};

use crate::error::Error;
use crate::model::{Clause, Column, Group, Literal, Operand, Order};
use crate::registry::{Registry, Rendering};
use escape::{quote_phrase, quote_sql};
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};

/// Name of the relevance score in the search engine.
pub const SCORE_FIELD: &str = "_score";

/// Placeholder for a value which is substituted by `format()`.
const PLACEHOLDER: &str = "\"%s\"";

/// Marks the position of a placeholder while rendering. Postgres text can't contain it.
const PLACEHOLDER_MARK: char = '\0';

/// Renders column references which end up as `format()` arguments.
pub trait ColumnRenderer: Send + Sync {
    fn render_column(&self, column: &Column) -> String;
}

/// Renders columns as `table.column`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct QualifiedColumns;

impl ColumnRenderer for QualifiedColumns {
    fn render_column(&self, column: &Column) -> String {
        format!("{}.{}", column.table, column.name)
    }
}

impl<F> ColumnRenderer for F
where
    F: Fn(&Column) -> String + Send + Sync,
{
    fn render_column(&self, column: &Column) -> String {
        self(column)
    }
}

/// A compiled search predicate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Compiled {
    /// The one table the search runs against.
    pub table: String,
    /// The search query, including a `#limit(...)` prefix if ordering got fused in.
    ///
    /// With format arguments present, this is the `format()` template: percent signs are
    /// doubled, except for the placeholders.
    pub query: String,
    /// SQL expressions substituted into the query's placeholders, in order.
    pub format_args: Vec<String>,
}

impl Display for Compiled {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let table = quote_sql(&self.table);
        if self.format_args.is_empty() {
            write!(f, "zdb('{table}', ctid) ==> '{}'", quote_sql(&self.query))
        } else {
            write!(
                f,
                "zdb('{table}', ctid) ==> format('{}', {})",
                quote_sql(&self.query),
                self.format_args.join(", ")
            )
        }
    }
}

/// The SQL expression of the relevance score of a row of `table`.
pub fn score_expression(table: &str) -> String {
    let table = quote_sql(table);
    format!("zdb_score('{table}', {table}.ctid)")
}

/// State of a single compilation.
///
/// Passed to [`custom renderings`](crate::registry::Rendering::Custom) so they can render
/// nested values.
pub struct RenderContext<'c> {
    registry: &'c Registry,
    renderer: &'c dyn ColumnRenderer,
    tables: BTreeSet<String>,
    format_args: Vec<String>,
}

impl<'c> RenderContext<'c> {
    fn new(registry: &'c Registry, renderer: &'c dyn ColumnRenderer) -> Self {
        Self {
            registry,
            renderer,
            tables: Default::default(),
            format_args: vec![],
        }
    }

    pub fn render_clause(&mut self, clause: &Clause) -> Result<String, Error> {
        match clause {
            Clause::Comparison(comparison) => {
                let registry = self.registry;
                let column = &comparison.column;
                self.tables.insert(column.table.clone());

                match registry.get(comparison.operator)? {
                    Rendering::Token(token) => Ok(format!(
                        "{}{}{}",
                        column.name,
                        token,
                        self.render_operand(&comparison.value)?
                    )),
                    Rendering::Custom(render) => render(column, &comparison.value, self),
                }
            }
            Clause::Group(group) => self.render_group(group),
            Clause::Literal(literal) => self.render_token(literal),
            Clause::Column(column) => Ok(self.placeholder(column)),
            Clause::Compiled(_) => Err(Error::UnsupportedClauseKind(clause.kind())),
        }
    }

    fn render_group(&mut self, group: &Group) -> Result<String, Error> {
        if group.children.is_empty() {
            return Err(Error::UnsupportedClauseKind("empty group".into()));
        }

        let children = group
            .children
            .iter()
            .map(|child| self.render_clause(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("({})", children.join(group.combinator.joiner())))
    }

    /// A literal standing on its own is part of the query text.
    fn render_token(&mut self, literal: &Literal) -> Result<String, Error> {
        match literal {
            Literal::String(text) | Literal::Raw(text) => Ok(text.clone()),
            Literal::Integer(_) | Literal::Float(_) | Literal::Phrase(_) => {
                self.render_literal(literal)
            }
            Literal::Table(table) => Err(Error::MisplacedTableLiteral(table.clone())),
            _ => Err(Error::UnsupportedClauseKind(format!(
                "{} literal",
                literal.kind()
            ))),
        }
    }

    pub fn render_operand(&mut self, operand: &Operand) -> Result<String, Error> {
        match operand {
            Operand::Literal(literal) => self.render_literal(literal),
            Operand::Column(column) => Ok(self.placeholder(column)),
            Operand::List(values) => {
                let values = values
                    .iter()
                    .map(|value| self.render_literal(value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", values.join(",")))
            }
        }
    }

    pub fn render_literal(&self, literal: &Literal) -> Result<String, Error> {
        match literal {
            Literal::String(value) => Ok(escape(value)),
            Literal::Integer(value) => Ok(value.to_string()),
            Literal::Float(value) => format_float(*value),
            Literal::Boolean(value) => Ok(value.to_string()),
            Literal::Null => Ok("null".into()),
            Literal::Raw(text) => Ok(text.clone()),
            Literal::Phrase(phrase) => Ok(quote_phrase(phrase)),
            Literal::Pattern(pattern) => Err(Error::InvalidParameter(format!(
                "Regular expression '{}' is only supported by LIKE",
                pattern.as_str()
            ))),
            Literal::Table(table) => Err(Error::InvalidParameter(format!(
                "Table '{table}' can't be used as a value"
            ))),
            #[cfg(feature = "time")]
            Literal::DateTime(value) => value
                .format(&::time::format_description::well_known::Rfc3339)
                .map(|value| escape(&value))
                .map_err(|err| Error::InvalidParameter(err.to_string())),
        }
    }

    fn placeholder(&mut self, column: &Column) -> String {
        self.format_args.push(format!(
            "replace({}, '\"', '')",
            self.renderer.render_column(column)
        ));
        PLACEHOLDER_MARK.to_string()
    }

    /// Turn the rendered text into a `format()` template, if there are format arguments.
    fn template(&self, text: String) -> Result<String, Error> {
        let marks = text.matches(PLACEHOLDER_MARK).count();
        if marks != self.format_args.len() {
            return Err(Error::InvalidParameter(
                "Query text must not contain NUL characters".into(),
            ));
        }

        if self.format_args.is_empty() {
            return Ok(text);
        }

        // percent signs of the text itself must survive format()
        Ok(text
            .replace('%', "%%")
            .replace(PLACEHOLDER_MARK, PLACEHOLDER))
    }

    fn render_limit(&mut self, order: &Order, limit: u64, offset: u64) -> String {
        let field = match order {
            Order::Column { column, .. } => {
                self.tables.insert(column.table.clone());
                column.name.as_str()
            }
            Order::Score { .. } => SCORE_FIELD,
        };

        format!("#limit({field} {}, {offset}, {limit}) ", order.direction())
    }

    fn take_table(&mut self) -> Result<String, Error> {
        let mut tables = std::mem::take(&mut self.tables).into_iter();
        match (tables.next(), tables.next()) {
            (None, _) => Err(Error::NoFilterTable),
            (Some(table), None) => Ok(table),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(tables);
                Err(Error::AmbiguousTable(all))
            }
        }
    }
}

/// Compiles clauses into a search predicate.
pub struct Compiler {
    registry: Registry,
    renderer: Box<dyn ColumnRenderer>,
}

impl Debug for Compiler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            renderer: Box::new(QualifiedColumns),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the renderer used for column references turning into `format()` arguments.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl ColumnRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile a list of clauses, which are joined using `and`.
    ///
    /// A [`Literal::Table`] declares the table to search, it must be the first clause. When an
    /// `order` is provided, it gets fused into the query together with `limit` and `offset`.
    /// Without an order, `limit` and `offset` are ignored, as the search syntax can't express
    /// them on their own.
    pub fn compile(
        &self,
        clauses: &[Clause],
        order: Option<&Order>,
        limit: u64,
        offset: u64,
    ) -> Result<Compiled, Error> {
        let mut context = RenderContext::new(&self.registry, self.renderer.as_ref());
        let mut query = Vec::with_capacity(clauses.len());

        for (i, clause) in clauses.iter().enumerate() {
            match clause {
                Clause::Literal(Literal::Table(table)) => {
                    if i > 0 {
                        return Err(Error::MisplacedTableLiteral(table.clone()));
                    }
                    context.tables.insert(table.clone());
                }
                clause => query.push(context.render_clause(clause)?),
            }
        }

        let prefix = order
            .map(|order| context.render_limit(order, limit, offset))
            .unwrap_or_default();

        let query = context.template(format!("{prefix}{}", query.join(" and ")))?;
        let table = context.take_table()?;
        let compiled = Compiled {
            table,
            query,
            format_args: context.format_args,
        };

        tracing::debug!(
            table = %compiled.table,
            query = %compiled.query,
            format_args = compiled.format_args.len(),
            "Compiled search query"
        );

        Ok(compiled)
    }
}
