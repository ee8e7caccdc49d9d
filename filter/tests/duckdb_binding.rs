//! Compiled statements executed against DuckDB.

use duckdb::{params_from_iter, Connection};
use rsql_filter::{dialect, ColumnMap, PreParser, ProcessOptions};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE people (full_name VARCHAR, dept VARCHAR, age VARCHAR);
        INSERT INTO people VALUES
            ('alice', 'ops', '34'),
            ('bob', 'dev', '28'),
            ('carol', 'dev', '41'),
            ('dave', 'sales', '25'),
            ('eve', 'ops', '52');
        "#,
    )
    .unwrap();
    conn
}

fn parser() -> PreParser {
    let columns = ColumnMap::from_pairs([("name", "full_name")]);
    dialect::duckdb_pre(columns.transfer()).build().unwrap()
}

fn names(conn: &Connection, query: &str) -> Vec<String> {
    let stmt = parser()
        .process_pre(query, &ProcessOptions::default())
        .unwrap()
        .expand();
    let sql = format!(
        "SELECT full_name FROM people WHERE {} ORDER BY full_name",
        stmt.sql
    );

    let mut prepared = conn.prepare(&sql).unwrap();
    let rows = prepared
        .query_map(params_from_iter(stmt.args.iter()), |row| row.get::<_, String>(0))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn test_equality() {
    let conn = setup();
    assert_eq!(names(&conn, "name==alice"), vec!["alice"]);
    assert_eq!(names(&conn, "dept!=dev"), vec!["alice", "dave", "eve"]);
}

#[test]
fn test_membership() {
    let conn = setup();
    assert_eq!(names(&conn, "dept=in=(ops,sales)"), vec!["alice", "dave", "eve"]);
    assert_eq!(names(&conn, "dept=out=(ops,sales)"), vec!["bob", "carol"]);
}

#[test]
fn test_relational() {
    let conn = setup();
    assert_eq!(names(&conn, "age=gt=40"), vec!["carol", "eve"]);
    assert_eq!(names(&conn, "age<=28"), vec!["bob", "dave"]);
}

#[test]
fn test_grouping_and_argument_order() {
    let conn = setup();
    assert_eq!(
        names(&conn, "(dept==ops,dept==sales);age=lt=40"),
        vec!["alice", "dave"]
    );
    assert_eq!(
        names(&conn, "name==bob,(dept=in=(ops);age>50)"),
        vec!["bob", "eve"]
    );
}

#[test]
fn test_empty_filter_matches_all() {
    let conn = setup();
    assert_eq!(names(&conn, "").len(), 5);
}

#[test]
fn test_empty_list_matches_nothing() {
    let conn = setup();
    let stmt = rsql_filter::Statement {
        sql: "\"dept\" in ?".to_string(),
        args: vec![rsql_filter::Arg::List(Vec::new())],
    }
    .expand();
    let sql = format!("SELECT count(*) FROM people WHERE {}", stmt.sql);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
    assert_eq!(count, 0);
}
