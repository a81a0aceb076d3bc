use super::*;
use crate::params::BoundParam;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Query(String, usize),
    QueryOne(String, usize),
    Execute(String, usize),
    Begin,
    Commit,
    Rollback,
}

/// Session that records every call and fails statements containing `FAIL`.
#[derive(Clone, Default)]
struct RecordingSession {
    calls: Rc<RefCell<Vec<Call>>>,
    fail_rollback: bool,
}

impl RecordingSession {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }
}

fn users() -> Vec<Row> {
    vec![
        Row::new(vec!["id".into(), "name".into()], vec![Value::Int(1), "alice".into()]),
        Row::new(vec!["id".into(), "name".into()], vec![Value::Int(2), "bob".into()]),
    ]
}

impl Session for RecordingSession {
    fn query(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Vec<Row>> {
        self.calls
            .borrow_mut()
            .push(Call::Query(sql.to_string(), params.len()));
        if sql.contains("FAIL") {
            return Err(SqlError::execution("syntax error near FAIL"));
        }
        Ok(users())
    }

    fn query_one(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<Option<Row>> {
        self.calls
            .borrow_mut()
            .push(Call::QueryOne(sql.to_string(), params.len()));
        if sql.contains("FAIL") {
            return Err(SqlError::execution("syntax error near FAIL"));
        }
        Ok(users().into_iter().next())
    }

    fn execute(&mut self, sql: &str, params: &[BoundParam]) -> SqlResult<u64> {
        self.calls
            .borrow_mut()
            .push(Call::Execute(sql.to_string(), params.len()));
        if sql.contains("FAIL") {
            return Err(SqlError::execution("constraint violation"));
        }
        Ok(1)
    }

    fn begin(&mut self) -> SqlResult<()> {
        self.calls.borrow_mut().push(Call::Begin);
        Ok(())
    }

    fn commit(&mut self) -> SqlResult<()> {
        self.calls.borrow_mut().push(Call::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> SqlResult<()> {
        self.calls.borrow_mut().push(Call::Rollback);
        if self.fail_rollback {
            return Err(SqlError::execution("connection reset"));
        }
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "recording"
    }
}

fn connection() -> (Connection, RecordingSession) {
    let session = RecordingSession::default();
    (Connection::with_session(Box::new(session.clone())), session)
}

#[test]
fn fetch_modes_do_not_open_transactions() {
    let (mut conn, session) = connection();
    let one = conn.fetch_one("SELECT id,name FROM users;", &Params::new()).unwrap();
    assert_eq!(one.unwrap().get("name"), Some(&Value::from("alice")));

    let all = conn.fetch_all("SELECT id,name FROM users;", &Params::new()).unwrap();
    assert_eq!(all.len(), 2);

    assert_eq!(session.count(&Call::Begin), 0);
    assert_eq!(session.count(&Call::Commit), 0);
}

#[test]
fn fetch_one_reads_a_single_row() {
    let (mut conn, session) = connection();
    let sql = "SELECT id,name FROM users;";
    conn.fetch_one(sql, &Params::new()).unwrap();
    assert_eq!(session.calls(), vec![Call::QueryOne(sql.into(), 0)]);
}

/// Session that only implements `query`, relying on the default `query_one`.
struct QueryOnlySession;

impl Session for QueryOnlySession {
    fn query(&mut self, _sql: &str, _params: &[BoundParam]) -> SqlResult<Vec<Row>> {
        Ok(users())
    }

    fn execute(&mut self, _sql: &str, _params: &[BoundParam]) -> SqlResult<u64> {
        Ok(0)
    }

    fn begin(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn rollback(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn driver_name(&self) -> &'static str {
        "query-only"
    }
}

#[test]
fn default_query_one_takes_the_first_row() {
    let mut conn = Connection::with_session(Box::new(QueryOnlySession));
    let row = conn.fetch_one("SELECT id,name FROM users;", &Params::new()).unwrap();
    assert_eq!(row.unwrap().get("id"), Some(&Value::Int(1)));
}

#[test]
fn fetch_as_hydrates_shape() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    let (mut conn, _) = connection();
    let users: Vec<User> = conn.fetch_all_as("SELECT id,name FROM users;", &Params::new()).unwrap();
    assert_eq!(
        users[1],
        User {
            id: 2,
            name: "bob".into()
        }
    );
}

#[test]
fn run_in_auto_mode_wraps_in_transaction() {
    let (mut conn, session) = connection();
    let mut params = Params::new();
    params.bind(1).bind("x");
    assert!(conn.run("UPDATE t SET a=?1 WHERE b=?2;", &params).unwrap());
    assert_eq!(
        session.calls(),
        vec![
            Call::Begin,
            Call::Execute("UPDATE t SET a=?1 WHERE b=?2;".into(), 2),
            Call::Commit,
        ]
    );
}

#[test]
fn failing_run_in_auto_mode_rolls_back_then_propagates() {
    let (mut conn, session) = connection();
    let err = conn.run("INSERT FAIL;", &Params::new()).unwrap_err();
    assert!(err.is_execution());
    assert_eq!(
        session.calls(),
        vec![Call::Begin, Call::Execute("INSERT FAIL;".into(), 0), Call::Rollback]
    );
    assert_eq!(conn.state(), TxState::Auto);
}

#[test]
fn failed_rollback_keeps_original_diagnostic() {
    let session = RecordingSession {
        fail_rollback: true,
        ..Default::default()
    };
    let mut conn = Connection::with_session(Box::new(session));
    let err = conn.run("INSERT FAIL;", &Params::new()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("constraint violation"));
    assert!(message.contains("rollback failed"));
}

#[test]
fn user_span_commits_exactly_once() {
    let (mut conn, session) = connection();
    conn.begin_transaction().unwrap();
    assert!(conn.in_transaction());
    for i in 0..3 {
        conn.run(&format!("INSERT INTO t VALUES ({i});"), &Params::new())
            .unwrap();
    }
    conn.commit_transaction().unwrap();

    assert_eq!(session.count(&Call::Begin), 1);
    assert_eq!(session.count(&Call::Commit), 1);
    assert_eq!(session.count(&Call::Rollback), 0);
    assert_eq!(conn.state(), TxState::Auto);
}

#[test]
fn user_span_rolls_back_exactly_once() {
    let (mut conn, session) = connection();
    conn.begin_transaction().unwrap();
    conn.run("INSERT INTO t VALUES (1);", &Params::new()).unwrap();
    conn.run("INSERT INTO t VALUES (2);", &Params::new()).unwrap();
    conn.rollback_transaction().unwrap();

    assert_eq!(session.count(&Call::Begin), 1);
    assert_eq!(session.count(&Call::Commit), 0);
    assert_eq!(session.count(&Call::Rollback), 1);
}

#[test]
fn failure_inside_user_span_is_left_to_the_caller() {
    let (mut conn, session) = connection();
    conn.begin_transaction().unwrap();
    assert!(conn.run("INSERT FAIL;", &Params::new()).unwrap_err().is_execution());

    assert_eq!(session.count(&Call::Rollback), 0);
    assert!(conn.in_transaction());
}

#[test]
fn nested_begin_is_rejected() {
    let (mut conn, session) = connection();
    conn.begin_transaction().unwrap();
    let err = conn.begin_transaction().unwrap_err();
    assert!(err.is_composition());
    assert_eq!(session.count(&Call::Begin), 1);
}

#[test]
fn commit_and_rollback_are_noops_in_auto_mode() {
    let (mut conn, session) = connection();
    conn.commit_transaction().unwrap();
    conn.rollback_transaction().unwrap();
    assert!(session.calls().is_empty());
}

#[test]
fn transaction_closure_commits_on_ok() {
    let (mut conn, session) = connection();
    let n = conn
        .transaction(|tx| {
            tx.run("INSERT INTO t VALUES (1);", &Params::new())?;
            tx.run("INSERT INTO t VALUES (2);", &Params::new())?;
            Ok(2)
        })
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(session.count(&Call::Commit), 1);
    assert_eq!(session.count(&Call::Rollback), 0);
}

#[test]
fn transaction_closure_rolls_back_on_err() {
    let (mut conn, session) = connection();
    let err = conn
        .transaction(|tx| {
            tx.run("INSERT INTO t VALUES (1);", &Params::new())?;
            tx.run("INSERT FAIL;", &Params::new())
        })
        .unwrap_err();
    assert!(err.is_execution());
    assert_eq!(session.count(&Call::Commit), 0);
    assert_eq!(session.count(&Call::Rollback), 1);
    assert_eq!(conn.state(), TxState::Auto);
}

#[test]
fn composition_errors_never_reach_the_session() {
    let (mut conn, session) = connection();
    let mut params = Params::new();
    params.bind_typed(1_usize, "not a number", crate::SqlType::Int);
    let err = conn.run("UPDATE t SET a=?1;", &params).unwrap_err();
    assert!(err.is_composition());
    assert!(session.calls().is_empty());
}

#[test]
fn closed_connection_rejects_every_operation() {
    let (mut conn, _) = connection();
    conn.close();
    conn.close();
    assert!(conn.is_closed());

    let no_params = Params::new();
    assert!(conn.fetch_one("SELECT 1;", &no_params).unwrap_err().is_connection());
    assert!(conn.fetch_all("SELECT 1;", &no_params).unwrap_err().is_connection());
    assert!(conn.run("DELETE FROM t;", &no_params).unwrap_err().is_connection());
    assert!(conn.begin_transaction().unwrap_err().is_connection());
    assert!(conn.commit_transaction().unwrap_err().is_connection());
    assert!(conn.rollback_transaction().unwrap_err().is_connection());
}

#[test]
fn close_rolls_back_open_span() {
    let (mut conn, session) = connection();
    conn.begin_transaction().unwrap();
    conn.close();
    assert_eq!(session.count(&Call::Rollback), 1);
    assert_eq!(conn.state(), TxState::Auto);
}

#[test]
fn drop_releases_session() {
    let (conn, session) = connection();
    assert_eq!(Rc::strong_count(&session.calls), 2);
    drop(conn);
    assert_eq!(Rc::strong_count(&session.calls), 1);
}

#[test]
fn truncates_long_sql_on_char_boundary() {
    let sql = "é".repeat(150);
    let truncated = truncate_sql(&sql);
    assert!(truncated.len() <= LOG_SQL_MAX_BYTES);
    assert!(sql.starts_with(truncated));
}
