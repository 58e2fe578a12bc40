//! Queue claim semantics under concurrent consumers.
//!
//! Every consumer opens its own connection to one database file, the way
//! separate worker processes do.

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

use seqsearch_core::db::DEFAULT_BUSY_TIMEOUT;
use seqsearch_core::{PendingQueue, SqlitePendingQueue};

const ENTRIES: usize = 200;
const CONSUMERS: usize = 8;

fn drain(queue: &SqlitePendingQueue) -> Vec<String> {
    let mut claimed = Vec::new();
    loop {
        match queue.claim_next() {
            Ok(Some(ticket)) => claimed.push(ticket),
            Ok(None) => break,
            // Unavailable is retried, exactly like the worker does
            Err(_) => thread::yield_now(),
        }
    }
    claimed
}

#[test]
fn test_concurrent_claims_return_each_entry_exactly_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("queue.db");

    let producer = SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap();
    for i in 0..ENTRIES {
        producer.enqueue(&format!("ticket{:04}", i), i as i64).unwrap();
    }

    let consumers: Vec<SqlitePendingQueue> = (0..CONSUMERS)
        .map(|_| SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap())
        .collect();

    let barrier = Arc::new(Barrier::new(CONSUMERS));
    let handles: Vec<_> = consumers
        .into_iter()
        .map(|queue| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                drain(&queue)
            })
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for handle in handles {
        for ticket in handle.join().expect("consumer panicked") {
            *counts.entry(ticket).or_default() += 1;
        }
    }

    assert_eq!(counts.len(), ENTRIES, "every entry must be claimed");
    assert!(
        counts.values().all(|&n| n == 1),
        "no entry may be claimed twice"
    );
    assert!(producer.is_empty().unwrap());
}

#[test]
fn test_claims_interleaved_with_enqueues_lose_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("queue.db");

    let producer = SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap();
    let consumer = SqlitePendingQueue::new(&db_path, DEFAULT_BUSY_TIMEOUT).unwrap();

    let producer_handle = thread::spawn(move || {
        for i in 0..50 {
            producer.enqueue(&format!("t{}", i), i).unwrap();
        }
        producer
    });

    let mut claimed = Vec::new();
    while claimed.len() < 50 {
        if let Ok(Some(ticket)) = consumer.claim_next() {
            claimed.push(ticket);
        }
    }
    let producer = producer_handle.join().unwrap();

    claimed.sort();
    claimed.dedup();
    assert_eq!(claimed.len(), 50);
    assert!(producer.is_empty().unwrap());
}

#[test]
fn test_fifo_order_by_submission_key() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let queue =
        SqlitePendingQueue::new(&temp_dir.path().join("queue.db"), DEFAULT_BUSY_TIMEOUT).unwrap();

    queue.enqueue("second", 2_000).unwrap();
    queue.enqueue("first", 1_000).unwrap();
    queue.enqueue("third", 2_000).unwrap();

    assert_eq!(drain(&queue), vec!["first", "second", "third"]);
}
