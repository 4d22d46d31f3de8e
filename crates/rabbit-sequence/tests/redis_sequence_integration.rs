use rabbit_sequence::{RedisSequence, Sequence};
use rabbit_test_infra::redis::RedisServer;
use std::collections::HashSet;

#[tokio::test]
#[ignore = "requires docker"]
async fn first_value_is_one_and_values_increase() {
    let redis = RedisServer::new().await.expect("start redis");
    let seq = RedisSequence::new(redis.connection().await.unwrap());

    assert_eq!(seq.key(), "shortener:id");
    assert_eq!(seq.next().await.unwrap(), 1);
    assert_eq!(seq.next().await.unwrap(), 2);
    assert_eq!(seq.next().await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn instances_sharing_a_key_never_collide() {
    let redis = RedisServer::new().await.expect("start redis");
    let url = redis.url().await.unwrap();

    let mut handles = vec![];
    for _ in 0..4 {
        let seq = RedisSequence::connect(&url).await.unwrap();
        handles.push(tokio::spawn(async move {
            let mut values = vec![];
            for _ in 0..100 {
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
    assert_eq!(all.len(), 400);
    assert_eq!(all.iter().max(), Some(&400));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn custom_keys_are_independent() {
    let redis = RedisServer::new().await.expect("start redis");
    let conn = redis.connection().await.unwrap();

    let a = RedisSequence::with_key(conn.clone(), "test:a");
    let b = RedisSequence::with_key(conn, "test:b");

    assert_eq!(a.next().await.unwrap(), 1);
    assert_eq!(a.next().await.unwrap(), 2);
    assert_eq!(b.next().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn non_numeric_key_is_an_error() {
    let redis = RedisServer::new().await.expect("start redis");
    let mut conn = redis.connection().await.unwrap();
    let _: () = redis::cmd("SET")
        .arg("test:bad")
        .arg("not-a-number")
        .query_async(&mut conn)
        .await
        .unwrap();

    let seq = RedisSequence::with_key(conn, "test:bad");
    assert!(seq.next().await.is_err());
}
