use rabbit_sequence::{MySqlSequence, Sequence};
use rabbit_test_infra::mysql::{MySqlServer, MysqlConfig};
use std::collections::HashSet;

async fn start() -> (MySqlServer, MySqlSequence) {
    let mysql = MySqlServer::new(MysqlConfig::builder().build())
        .await
        .expect("start mysql");
    let pool = mysql.pool().await.expect("connect mysql");
    let seq = MySqlSequence::new(pool);
    seq.ensure_schema().await.expect("create schema");
    (mysql, seq)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn values_strictly_increase() {
    let (_mysql, seq) = start().await;

    let first = seq.next().await.unwrap();
    let second = seq.next().await.unwrap();
    let third = seq.next().await.unwrap();

    assert_eq!(first, 1);
    assert!(second > first);
    assert!(third > second);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn table_keeps_a_single_row() {
    let (_mysql, seq) = start().await;
    for _ in 0..10 {
        seq.next().await.unwrap();
    }

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sequence")
        .fetch_one(seq.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn concurrent_callers_never_share_a_value() {
    let (_mysql, seq) = start().await;

    let mut handles = vec![];
    for _ in 0..4 {
        let seq = seq.clone();
        handles.push(tokio::spawn(async move {
            let mut values = vec![];
            for _ in 0..50 {
                values.push(seq.next().await.unwrap());
            }
            values
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        for v in handle.await.unwrap() {
            assert!(all.insert(v), "value {v} issued twice");
        }
    }
    assert_eq!(all.len(), 200);
}
