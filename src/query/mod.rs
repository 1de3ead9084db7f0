//! Rewrites `SELECT` statements into Sqoop free-form import queries.
//!
//! Sqoop needs a `$CONDITIONS` token in the query so it can inject the
//! per-split predicate, and a boundary query that yields the minimum and
//! maximum of the split column. Left to itself Sqoop derives the boundary
//! query from the import query, which fails when the split column is not
//! selected. The decomposition here is regex based and deliberately narrow:
//! a statement is `SELECT <list> FROM <from> [WHERE <condition>]`, and only
//! the last `WHERE` keyword separates the from clause from the condition.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Token Sqoop replaces with the predicate of each split.
pub const CONDITIONS_TOKEN: &str = "$CONDITIONS";

static SELECT_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^SELECT\b(?P<select>.*?)\bFROM\b(?:(?P<from_where>.*)\bWHERE\b(?P<condition>.*)|(?P<from>.*))$",
    )
});

/// Fragments of a decomposed `SELECT` statement, each trimmed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryDecomposition {
    /// Text between `SELECT` and the first `FROM`.
    pub select_list: String,
    /// Text between `FROM` and the last `WHERE`, or the end of the query.
    pub from_clause: String,
    /// Text after the last `WHERE`, if any.
    pub where_condition: Option<String>,
}

/// Queries handed to `sqoop import`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewrittenQuery {
    /// Import query carrying the `$CONDITIONS` placeholder.
    pub full_query: String,
    /// Query returning the minimum and maximum of the split column.
    pub boundary_query: String,
}

/// Errors raised before any remote call when a query cannot be rewritten.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum QueryError {
    /// The partition column is not of the form `table.column`.
    #[error("partition column `{column}` must be prefixed by its table, as in `table.column`")]
    InvalidPartitionColumn {
        /// Column as supplied by the caller.
        column: String,
    },
    /// The statement is not a `SELECT … FROM …` the rewriter understands.
    #[error("unrecognised query: {query}")]
    UnrecognizedQuery {
        /// Statement as supplied by the caller.
        query: String,
    },
    /// The built-in or derived pattern failed to compile.
    #[error("query pattern failed to compile: {0}")]
    Pattern(String),
}

/// Splits `query` into its select list, from clause, and optional condition.
///
/// Surrounding whitespace and one trailing `;` are ignored. Keywords match
/// case-insensitively on word boundaries and may span lines.
///
/// # Errors
///
/// Returns [`QueryError::UnrecognizedQuery`] when the statement does not
/// start with `SELECT`, lacks a `FROM`, or has an empty fragment.
///
/// # Examples
///
/// ```
/// use mrgate::query::decompose;
///
/// let parts = decompose("select a from b where x = 1 and y in (select y from c where z)")?;
/// assert_eq!(parts.select_list, "a");
/// assert_eq!(parts.from_clause, "b where x = 1 and y in (select y from c");
/// assert_eq!(parts.where_condition.as_deref(), Some("z)"));
/// # Ok::<(), mrgate::query::QueryError>(())
/// ```
pub fn decompose(query: &str) -> Result<QueryDecomposition, QueryError> {
    let statement = normalise(query);
    let pattern = SELECT_PATTERN
        .as_ref()
        .map_err(|err| QueryError::Pattern(err.to_string()))?;
    let unrecognised = || QueryError::UnrecognizedQuery {
        query: query.to_owned(),
    };
    let captures = pattern.captures(statement).ok_or_else(unrecognised)?;
    let fragment = |name: &str| captures.name(name).map(|found| found.as_str().trim());

    let select_list = fragment("select").unwrap_or_default();
    let (from_clause, where_condition) = match fragment("condition") {
        Some(condition) => (fragment("from_where").unwrap_or_default(), Some(condition)),
        None => (fragment("from").unwrap_or_default(), None),
    };
    if select_list.is_empty()
        || from_clause.is_empty()
        || where_condition.is_some_and(str::is_empty)
    {
        return Err(unrecognised());
    }

    Ok(QueryDecomposition {
        select_list: select_list.to_owned(),
        from_clause: from_clause.to_owned(),
        where_condition: where_condition.map(str::to_owned),
    })
}

/// Builds the `$CONDITIONS` import query and the boundary query for
/// splitting `query` on `partition_column`.
///
/// The partition column is validated before the query is parsed. When one
/// select item is the bare column, optionally table-qualified and never
/// aliased, the boundary query is the statement itself; otherwise it is
/// `SELECT MIN(col), MAX(col) FROM <from> [WHERE <condition>]`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidPartitionColumn`] when the column is not
/// `table.column`, or [`QueryError::UnrecognizedQuery`] when the statement
/// cannot be decomposed.
pub fn rewrite_import_query(
    query: &str,
    partition_column: &str,
) -> Result<RewrittenQuery, QueryError> {
    let column = column_name(partition_column)?;
    let parts = decompose(query)?;
    let statement = normalise(query);

    let connective = if parts.where_condition.is_some() {
        "AND"
    } else {
        "WHERE"
    };
    let full_query = format!("{statement} {connective} {CONDITIONS_TOKEN}");

    let boundary_query = if selects_bare_column(&parts.select_list, column)? {
        statement.to_owned()
    } else {
        let mut bounds = format!(
            "SELECT MIN({column}), MAX({column}) FROM {}",
            parts.from_clause
        );
        if let Some(condition) = parts.where_condition.as_deref() {
            bounds.push_str(" WHERE ");
            bounds.push_str(condition);
        }
        bounds
    };

    Ok(RewrittenQuery {
        full_query,
        boundary_query,
    })
}

/// Returns the column part of a `table.column` partition column.
///
/// # Errors
///
/// Returns [`QueryError::InvalidPartitionColumn`] unless the value holds
/// exactly one `.` with a non-empty name on each side.
pub fn column_name(partition_column: &str) -> Result<&str, QueryError> {
    match partition_column.split_once('.') {
        Some((table, column))
            if !table.trim().is_empty()
                && !column.trim().is_empty()
                && !column.contains('.') =>
        {
            Ok(column.trim())
        }
        _ => Err(QueryError::InvalidPartitionColumn {
            column: partition_column.to_owned(),
        }),
    }
}

fn normalise(query: &str) -> &str {
    let trimmed = query.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end()
}

fn selects_bare_column(select_list: &str, column: &str) -> Result<bool, QueryError> {
    let pattern = Regex::new(&format!(r"(?i)^(?:\w+\.)?{}$", regex::escape(column)))
        .map_err(|err| QueryError::Pattern(err.to_string()))?;
    Ok(select_items(select_list)
        .into_iter()
        .any(|item| pattern.is_match(item.trim())))
}

/// Splits a select list on the commas outside parentheses.
fn select_items(select_list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, ch) in select_list.char_indices() {
        match ch {
            '(' => depth = depth.saturating_add(1),
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.extend(select_list.get(start..index));
                start = index.saturating_add(1);
            }
            _ => {}
        }
    }
    items.extend(select_list.get(start..));
    items
}
