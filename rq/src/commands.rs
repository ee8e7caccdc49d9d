//! Command implementations.

use std::path::Path;

use duckdb::{params_from_iter, Connection};
use filter::{dialect, Arg, Config, Dialect, ProcessOptions, Statement};
use tracing::debug;

use crate::error::{Error, Result};
use crate::InlineDialect;

/// Load the config file given on the command line, or resolve the default.
///
/// Only the implicit locations may be missing; a path named with `--config`
/// must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) if !path.exists() => {
            return Err(filter::Error::NotFound(format!("config {}", path.display())).into())
        }
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Options for `rq compile`.
pub struct CompileOptions<'a> {
    pub entity: Option<&'a str>,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub dialect: Option<Dialect>,
    pub format: &'a str,
    pub expand: bool,
}

pub fn compile(config: &Config, query: &str, opts: &CompileOptions) -> Result<()> {
    let dialect = opts.dialect.unwrap_or(config.dialect);
    let (parser, entity_opts) = config.pre_parser_for(dialect, opts.entity)?;
    let process_opts = merge_options(entity_opts, &opts.allow, &opts.deny);

    let statement = parser.process_pre(query, &process_opts)?;

    match opts.format {
        "json" => {
            let json = if opts.expand {
                serde_json::to_string_pretty(&statement.expand())?
            } else {
                serde_json::to_string_pretty(&statement)?
            };
            println!("{}", json);
        }
        "sql" => print_statement(&statement, opts.expand),
        other => {
            return Err(Error::InvalidArgument(format!(
                "unknown format '{}' (expected sql or json)",
                other
            )))
        }
    }

    Ok(())
}

/// Command-line keys extend the entity policy rather than replace it.
fn merge_options(base: ProcessOptions, allow: &[String], deny: &[String]) -> ProcessOptions {
    let mut allowed = base.allowed().to_vec();
    allowed.extend(allow.iter().cloned());
    let mut forbidden = base.forbidden().to_vec();
    forbidden.extend(deny.iter().cloned());

    ProcessOptions::new()
        .allowed_keys(allowed)
        .forbidden_keys(forbidden)
}

fn print_statement(statement: &Statement, expand: bool) {
    if expand {
        let expanded = statement.expand();
        println!("{}", expanded.sql);
        for (i, arg) in expanded.args.iter().enumerate() {
            println!("  ${} = {:?}", i + 1, arg);
        }
        return;
    }

    println!("{}", statement.sql);
    for (i, arg) in statement.args.iter().enumerate() {
        match arg {
            Arg::Scalar(v) => println!("  ${} = {:?}", i + 1, v),
            Arg::List(values) => println!("  ${} = {:?}", i + 1, values),
        }
    }
}

pub fn render(config: &Config, query: &str, target: InlineDialect) -> Result<()> {
    let parser = match target {
        InlineDialect::Mysql => config.inline_parser()?,
        InlineDialect::Mongo => dialect::mongo().max_depth(config.max_depth).build()?,
    };

    let rendered = parser.process(query, &ProcessOptions::default())?;
    println!("{}", rendered);
    Ok(())
}

/// Rows returned by `rq select`, every cell rendered as text by DuckDB.
struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

pub fn select(
    config: &Config,
    query: &str,
    db: &Path,
    table: &str,
    entity: Option<&str>,
    limit: Option<usize>,
    format: &str,
) -> Result<()> {
    if !db.exists() {
        return Err(filter::Error::NotFound(format!("database {}", db.display())).into());
    }

    let (parser, opts) = config.pre_parser_for(Dialect::Duckdb, entity)?;
    let statement = parser.process_pre(query, &opts)?.expand();

    let conn = Connection::open(db)?;
    let columns = table_columns(&conn, table)?;

    let mut sql = format!(
        "SELECT {} FROM {} WHERE {}",
        text_projection(&columns),
        dialect::ansi_ident(table),
        statement.sql
    );
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }
    debug!(sql = %sql, args = statement.args.len(), "running filter");

    let rows = run_query(&conn, &sql, columns.len(), &statement.args)?;
    let result = QueryResult { columns, rows };

    match format {
        "json" => print_json(&result)?,
        "table" => print_table(&result),
        other => {
            return Err(Error::InvalidArgument(format!(
                "unknown format '{}' (expected table or json)",
                other
            )))
        }
    }

    Ok(())
}

/// Column names of `table`, in declaration order.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("DESCRIBE {}", dialect::ansi_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(columns)
}

/// `CAST("c" AS VARCHAR) AS "c", ...`: DuckDB formats every type itself.
fn text_projection(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| {
            let quoted = dialect::ansi_ident(c);
            format!("CAST({} AS VARCHAR) AS {}", quoted, quoted)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_query(
    conn: &Connection,
    sql: &str,
    width: usize,
    args: &[String],
) -> Result<Vec<Vec<Option<String>>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            (0..width)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<duckdb::Result<Vec<_>>>()
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(rows)
}

const MAX_CELL: usize = 50;

fn clip(cell: Option<&str>) -> String {
    let cell = cell.unwrap_or("NULL");
    if cell.chars().count() > MAX_CELL {
        let head: String = cell.chars().take(MAX_CELL - 3).collect();
        format!("{}...", head)
    } else {
        cell.to_string()
    }
}

fn print_table(result: &QueryResult) {
    if result.rows.is_empty() {
        println!("No results.");
        return;
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|c| clip(c.as_deref())).collect())
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain([name.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    print_row(&result.columns, &widths);
    let rules: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    print_row(&rules, &widths);
    for row in &cells {
        print_row(row, &widths);
    }

    println!("\n({} rows)", result.rows.len());
}

fn print_row(values: &[String], widths: &[usize]) {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, &w)| format!("{:w$}", v, w = w))
        .collect();
    println!("{}", padded.join(" ").trim_end());
}

fn print_json(result: &QueryResult) -> Result<()> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(|cell| match cell {
                    Some(v) => serde_json::Value::String(v.clone()),
                    None => serde_json::Value::Null,
                }))
                .collect()
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
