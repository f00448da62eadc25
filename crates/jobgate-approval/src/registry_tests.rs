use super::*;
use crate::broker::MemoryBroker;
use crate::error::ApprovalError;
use serde_json::json;

fn registry() -> (Arc<MemoryBroker>, PendingRegistry) {
    let broker = Arc::new(MemoryBroker::new());
    let registry = PendingRegistry::new(broker.clone(), "pending_jobs");
    (broker, registry)
}

#[tokio::test]
async fn test_next_id_sequence() {
    let (_, registry) = registry();
    assert_eq!(registry.next_id().await.unwrap(), 0);
    assert_eq!(registry.next_id().await.unwrap(), 1);
    assert_eq!(registry.next_id().await.unwrap(), 2);
}

#[tokio::test]
async fn test_insert_lookup_delete() {
    let (_, registry) = registry();
    let key = ApprovalKey::new(0);
    let job = Job::new("Job").with_arg(json!({}));

    registry.insert(&key, &job).await.unwrap();
    assert_eq!(registry.size().await.unwrap(), 1);
    assert_eq!(registry.lookup(&key).await.unwrap(), Some(job));
    assert_eq!(
        registry.lookup_raw(r#"{"id":0}"#).await.unwrap().as_deref(),
        Some(r#"{"class":"Job","args":[{}]}"#)
    );

    assert!(registry.delete(&key).await.unwrap());
    assert!(!registry.delete(&key).await.unwrap());
    assert_eq!(registry.lookup(&key).await.unwrap(), None);
    assert_eq!(registry.size().await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_overwrites() {
    let (_, registry) = registry();
    let key = ApprovalKey::new(0);

    registry.insert(&key, &Job::new("First")).await.unwrap();
    registry.insert(&key, &Job::new("Second")).await.unwrap();

    assert_eq!(registry.size().await.unwrap(), 1);
    assert_eq!(registry.lookup(&key).await.unwrap().unwrap().class, "Second");
}

#[tokio::test]
async fn test_lookup_distinguishes_encodings() {
    let (_, registry) = registry();
    let key = ApprovalKey::new(0).with_message("m");
    registry.insert(&key, &Job::new("Job")).await.unwrap();

    assert!(registry.lookup(&ApprovalKey::new(0)).await.unwrap().is_none());
    assert!(registry.lookup(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_keys_sorted_by_id() {
    let (_, registry) = registry();
    let keys = [
        ApprovalKey::new(10),
        ApprovalKey::new(2).with_message("test message"),
        ApprovalKey::new(1).with_timeout(10),
        ApprovalKey::new(0),
    ];
    for key in &keys {
        registry.insert(key, &Job::new("Job")).await.unwrap();
    }

    let listed = registry.list_keys().await.unwrap();
    let ids: Vec<u64> = listed.iter().map(|k| k.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 10]);
    assert_eq!(listed[1], ApprovalKey::new(1).with_timeout(10));
}

#[tokio::test]
async fn test_list_keys_malformed_field() {
    let (broker, registry) = registry();
    broker.hash_set("pending_jobs", "not a key", "{}").await.unwrap();

    let result = registry.list_keys().await;
    assert!(matches!(result, Err(ApprovalError::MalformedEncoding(_))));
}

#[tokio::test]
async fn test_list_pending() {
    let (_, registry) = registry();
    registry
        .insert(&ApprovalKey::new(1), &Job::new("B"))
        .await
        .unwrap();
    registry
        .insert(&ApprovalKey::new(0), &Job::new("A"))
        .await
        .unwrap();

    let pending = registry.list_pending().await.unwrap();
    let classes: Vec<&str> = pending.iter().map(|(_, job)| job.class.as_str()).collect();
    assert_eq!(classes, vec!["A", "B"]);
}
