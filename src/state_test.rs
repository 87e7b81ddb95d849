use std::time::Duration;

use tokio::time::timeout;

use super::*;

#[tokio::test]
async fn same_code_serializes() {
    let locks = SessionLocks::default();
    let guard = locks.acquire("ABCDEF").await;

    let locks2 = locks.clone();
    let waiter = tokio::spawn(async move {
        let _guard = locks2.acquire("ABCDEF").await;
    });

    // Second acquire must block while the first guard is held.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should acquire after release")
        .unwrap();
}

#[tokio::test]
async fn lock_keys_are_case_insensitive() {
    let locks = SessionLocks::default();
    let guard = locks.acquire("abcdef").await;

    let locks2 = locks.clone();
    let waiter = tokio::spawn(async move {
        let _guard = locks2.acquire("ABCDEF").await;
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());
    drop(guard);
    timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
}

#[tokio::test]
async fn different_codes_do_not_contend() {
    let locks = SessionLocks::default();
    let _guard = locks.acquire("AAAAAA").await;

    // Must complete immediately despite the held lock on another code.
    timeout(Duration::from_millis(100), locks.acquire("BBBBBB"))
        .await
        .expect("unrelated code should not block");
}

#[tokio::test]
async fn removed_entry_can_be_reacquired() {
    let locks = SessionLocks::default();
    {
        let _guard = locks.acquire("ABCDEF").await;
    }
    locks.remove("ABCDEF").await;
    let _guard = locks.acquire("ABCDEF").await;
}
