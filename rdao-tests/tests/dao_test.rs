//! Generated DAOs driven through a recording store handle
//!
//! `RecordingQuerier` captures every statement with its bound parameters
//! and answers reads from canned rows, so these tests check the SQL and
//! binding order the generator emits without a database.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rdao::{
    Context, Criteria, Direction, Error, ExecuteResult, FromRow, FromValue, Page, Querier, Result,
    Value, ValueRow,
};
use rust_decimal::Decimal;
use serde::Serialize;

use rdao_tests::dao::order::OrderDao;
use rdao_tests::dao::user::UserDao;
use rdao_tests::domain::{Base, Order, User};

#[derive(Default)]
struct RecordingQuerier {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Mutex<VecDeque<Vec<ValueRow>>>,
    scalars: Mutex<VecDeque<Value>>,
    result: ExecuteResult,
}

impl RecordingQuerier {
    fn with_result(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            result: ExecuteResult {
                rows_affected,
                last_insert_id,
            },
            ..Default::default()
        }
    }

    fn push_rows(&self, rows: Vec<ValueRow>) {
        self.rows.lock().unwrap().push_back(rows);
    }

    fn push_scalar(&self, value: impl Into<Value>) {
        self.scalars.lock().unwrap().push_back(value.into());
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: Vec<Value>) {
        self.calls.lock().unwrap().push((sql.to_string(), params));
    }

    fn next_rows(&self) -> Vec<ValueRow> {
        self.rows.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[async_trait]
impl Querier for RecordingQuerier {
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<ExecuteResult> {
        self.record(sql, params);
        Ok(self.result.clone())
    }

    async fn fetch_all<T: FromRow + Send>(&self, sql: &str, params: Vec<Value>) -> Result<Vec<T>> {
        self.record(sql, params);
        self.next_rows().iter().map(T::from_row).collect()
    }

    async fn fetch_optional<T: FromRow + Send>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>> {
        self.record(sql, params);
        self.next_rows().first().map(T::from_row).transpose()
    }

    async fn fetch_scalar<T: FromValue + Send>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        self.record(sql, params);
        let value = self.scalars.lock().unwrap().pop_front();
        T::from_value(value.unwrap_or(Value::I64(0)))
    }
}

fn ann() -> User {
    User {
        id: 0,
        name: "ann".to_string(),
        age: 30,
        tags: vec!["admin".to_string()],
        base: Base {
            create_at: NaiveDate::from_ymd_opt(2024, 1, 2).and_then(|d| d.and_hms_opt(3, 4, 5)),
            update_at: None,
        },
        session: Some("cached".to_string()),
    }
}

fn user_row(id: i64, name: &str) -> ValueRow {
    ValueRow::new()
        .with("id", id)
        .with("user_name", name)
        .with("age", 30_i32)
        .with("tags", Value::Json(serde_json::json!(["admin"])))
        .with("create_at", Value::Null)
        .with("update_at", Value::Null)
}

#[tokio::test]
async fn test_insert_binds_columns_and_fills_key() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, Some(42)));
    let ctx = Context::background();
    let mut user = ann();

    let affected = dao.insert(&ctx, &mut user).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(user.id, 42);

    let calls = dao.db().calls();
    assert_eq!(calls.len(), 1);
    let (sql, params) = &calls[0];
    assert_eq!(
        sql,
        "INSERT INTO `user` (`user_name`, `age`, `tags`, `create_at`, `update_at`) \
         VALUES (?, ?, ?, ?, ?)"
    );
    assert_eq!(params.len(), 5);
    assert_eq!(params[0], Value::String("ann".into()));
    assert_eq!(params[1], Value::I32(30));
    assert_eq!(params[2], Value::Json(serde_json::json!(["admin"])));
    assert!(matches!(params[3], Value::DateTime(_)));
    assert_eq!(params[4], Value::Null);
}

#[tokio::test]
async fn test_insert_without_generated_key_keeps_entity() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, None));
    let mut user = User { id: 7, ..ann() };
    dao.insert(&Context::background(), &mut user).await.unwrap();
    assert_eq!(user.id, 7);
}

#[tokio::test]
async fn test_string_key_is_written_and_never_replaced() {
    let dao = OrderDao::new(RecordingQuerier::with_result(1, Some(9)));
    let mut order = Order {
        order_no: "A-1".to_string(),
        user_id: 42,
        amount: Decimal::new(1999, 2),
        base: Base::default(),
    };
    dao.insert(&Context::background(), &mut order).await.unwrap();
    assert_eq!(order.order_no, "A-1");

    let calls = dao.db().calls();
    assert!(calls[0].0.starts_with("INSERT INTO `order` (`order_no`, `user_id`, `amount`"));
    assert_eq!(calls[0].1[0], Value::String("A-1".into()));
    assert_eq!(calls[0].1[2], Value::Decimal(Decimal::new(1999, 2)));
}

#[tokio::test]
async fn test_upsert_binds_every_column() {
    let dao = UserDao::new(RecordingQuerier::with_result(2, Some(5)));
    let mut user = User { id: 5, ..ann() };
    let affected = dao.upsert(&Context::background(), &mut user).await.unwrap();
    assert_eq!(affected, 2);

    let (sql, params) = &dao.db().calls()[0];
    assert!(sql.starts_with("INSERT INTO `user` (`id`, `user_name`"));
    assert!(sql.contains("ON DUPLICATE KEY UPDATE `user_name` = VALUES(`user_name`)"));
    assert!(!sql.contains("`id` = VALUES(`id`)"));
    assert_eq!(params.len(), 6);
    assert_eq!(params[0], Value::I64(5));
}

#[tokio::test]
async fn test_upsert_none_zero_skips_zero_columns() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, Some(8)));
    let mut user = User {
        name: "bob".to_string(),
        ..User::default()
    };
    dao.upsert_none_zero(&Context::background(), &mut user)
        .await
        .unwrap();
    assert_eq!(user.id, 8);

    let (sql, params) = &dao.db().calls()[0];
    assert_eq!(
        sql,
        "INSERT INTO `user` (`user_name`) VALUES (?) \
         ON DUPLICATE KEY UPDATE `user_name` = VALUES(`user_name`)"
    );
    assert_eq!(params, &vec![Value::String("bob".into())]);
}

#[tokio::test]
async fn test_update_binds_key_last() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, None));
    let user = User { id: 3, ..ann() };
    dao.update(&Context::background(), &user).await.unwrap();

    let (sql, params) = &dao.db().calls()[0];
    assert_eq!(
        sql,
        "UPDATE `user` SET `user_name` = ?, `age` = ?, `tags` = ?, `create_at` = ?, \
         `update_at` = ? WHERE `id` = ?"
    );
    assert_eq!(params.last(), Some(&Value::I64(3)));
}

#[tokio::test]
async fn test_update_none_zero() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, None));
    let user = User {
        id: 3,
        name: "ann".to_string(),
        ..User::default()
    };
    dao.update_none_zero(&Context::background(), &user)
        .await
        .unwrap();

    let (sql, params) = &dao.db().calls()[0];
    assert_eq!(sql, "UPDATE `user` SET `user_name` = ? WHERE `id` = ?");
    assert_eq!(params, &vec![Value::String("ann".into()), Value::I64(3)]);
}

#[tokio::test]
async fn test_update_none_zero_with_nothing_to_write() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, None));
    let user = User {
        id: 3,
        ..User::default()
    };
    let affected = dao
        .update_none_zero(&Context::background(), &user)
        .await
        .unwrap();
    assert_eq!(affected, 0);
    assert!(dao.db().calls().is_empty());
}

#[tokio::test]
async fn test_update_many_binds_set_before_predicates() {
    let dao = UserDao::new(RecordingQuerier::with_result(4, None));
    let user = User {
        age: 31,
        ..User::default()
    };
    let affected = dao
        .update_many_none_zero(
            &Context::background(),
            &user,
            &[Criteria::gte("age", 30).and(Criteria::like("user_name", "a%"))],
        )
        .await
        .unwrap();
    assert_eq!(affected, 4);

    let (sql, params) = &dao.db().calls()[0];
    assert!(sql.starts_with("UPDATE `user` SET `age` = ? WHERE "));
    assert_eq!(params[0], Value::I32(31));
    assert_eq!(params[1], Value::I32(30));
    assert_eq!(params[2], Value::String("a%".into()));
}

#[tokio::test]
async fn test_bulk_writes_need_a_predicate() {
    let dao = UserDao::new(RecordingQuerier::with_result(1, None));
    let ctx = Context::background();

    let err = dao.delete_many(&ctx, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ref msg) if msg.contains("UserDao::delete_many")));

    let blank = [Criteria::raw("  ", vec![])];
    let err = dao.update_many(&ctx, &ann(), &blank).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    assert!(dao.db().calls().is_empty());
}

#[tokio::test]
async fn test_delete_many() {
    let dao = UserDao::new(RecordingQuerier::with_result(2, None));
    let affected = dao
        .delete_many(&Context::background(), &[Criteria::in_list("id", &[1_i64, 2])])
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let (sql, params) = &dao.db().calls()[0];
    assert!(sql.starts_with("DELETE FROM `user` WHERE `id` IN"));
    assert_eq!(params, &vec![Value::I64(1), Value::I64(2)]);
}

#[tokio::test]
async fn test_get_decodes_flattened_row() {
    let dao = UserDao::new(RecordingQuerier::default());
    dao.db().push_rows(vec![user_row(3, "ann")]);

    let user = dao.get(&Context::background(), 3).await.unwrap().unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.name, "ann");
    assert_eq!(user.tags, vec!["admin"]);
    assert_eq!(user.base, Base::default());
    assert_eq!(user.session, None);

    let (sql, params) = &dao.db().calls()[0];
    assert_eq!(
        sql,
        "SELECT `id`, `user_name`, `age`, `tags`, `create_at`, `update_at` FROM `user` \
         WHERE `id` = ?"
    );
    assert_eq!(params, &vec![Value::I64(3)]);
}

#[derive(Debug, Serialize, FromRow)]
struct Tagged {
    id: i64,
    #[rdao(json)]
    #[serde(flatten)]
    extra: HashMap<String, String>,
}

#[test]
fn test_json_column_ignores_serde_flatten() {
    let row = ValueRow::new()
        .with("id", 5_i64)
        .with("extra", Value::Json(serde_json::json!({"color": "red"})));
    let tagged = Tagged::from_row(&row).unwrap();
    assert_eq!(tagged.id, 5);
    assert_eq!(tagged.extra.get("color").map(String::as_str), Some("red"));
}

#[tokio::test]
async fn test_get_missing_row() {
    let dao = OrderDao::new(RecordingQuerier::default());
    let order = dao.get(&Context::background(), "nope").await.unwrap();
    assert!(order.is_none());
    assert_eq!(dao.db().calls()[0].1, vec![Value::String("nope".into())]);
}

#[tokio::test]
async fn test_select_and_count() {
    let dao = UserDao::new(RecordingQuerier::default());
    dao.db().push_rows(vec![user_row(1, "ann"), user_row(2, "bob")]);
    dao.db().push_scalar(Value::I64(2));
    let ctx = Context::background();
    let adults = [Criteria::gte("age", 18)];

    let users = dao.select_many(&ctx, &adults).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "bob");

    let count = dao.count_many(&ctx, &adults).await.unwrap();
    assert_eq!(count, 2);

    let calls = dao.db().calls();
    assert!(calls[0].0.ends_with("FROM `user` WHERE `age` >= ?"));
    assert_eq!(calls[1].0, "SELECT COUNT(1) FROM `user` WHERE `age` >= ?");
}

#[tokio::test]
async fn test_page_many() {
    let dao = UserDao::new(RecordingQuerier::default());
    dao.db().push_rows(vec![user_row(21, "ann")]);
    dao.db().push_scalar(Value::I64(45));

    let page = Page::new(2, 20).order_by("id", Direction::Desc);
    let ret = dao
        .page_many(&Context::background(), &page, &[])
        .await
        .unwrap();
    assert_eq!(ret.items.len(), 1);
    assert_eq!(ret.total, 45);
    assert_eq!(ret.page_no, 2);
    assert!(ret.has_next);

    let calls = dao.db().calls();
    assert!(calls[0].0.ends_with("FROM `user` ORDER BY `id` DESC LIMIT 20,20"));
    assert_eq!(calls[1].0, "SELECT COUNT(1) FROM `user`");
}

#[tokio::test]
async fn test_cancelled_context_skips_the_store() {
    let dao = UserDao::new(RecordingQuerier::default());
    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();

    let err = dao.count_many(&ctx, &[]).await.unwrap_err();
    assert!(matches!(err.root(), Error::Cancelled));
    assert!(err.to_string().starts_with("UserDao::count_many"));
    assert!(dao.db().calls().is_empty());
}
