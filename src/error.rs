use crate::model::Operator;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported clause kind: {0}")]
    UnsupportedClauseKind(String),
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(Operator),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("No filters passed, unable to determine the search table")]
    NoFilterTable,
    #[error("Filters reference more than one table: {}", .0.join(", "))]
    AmbiguousTable(Vec<String>),
    #[error("Table '{0}' can only be declared as the first clause")]
    MisplacedTableLiteral(String),
    #[error("Unsupported clause: {0}")]
    UnsupportedClause(String),
}
