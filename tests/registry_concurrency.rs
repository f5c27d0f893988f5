//! Tests for the column registry under concurrent first use.
//!
//! This module tests:
//! - Many threads resolving the same row type observe one shared descriptor
//! - Distinct row types and distinct tag keys never share cache entries

use std::sync::{Arc, Barrier};
use std::thread;

use row_patcher::{ColumnEntry, FieldMap, Patcher, Registry, row};

row! {
    #[derive(Debug, Clone, Default)]
    struct Order {
        #[column(spanner = "OrderId", db = "order_id")]
        id: i64,
        #[column(spanner = "Total", db = "total")]
        total: u64,
        #[column(spanner = "Notes")]
        notes: Vec<String>,
    }
}

row! {
    #[derive(Debug, Clone, Default)]
    struct Customer {
        #[column(spanner = "CustomerId", db = "customer_id")]
        id: i64,
    }
}

const THREADS: usize = 16;

#[test]
fn test_single_descriptor_under_contention() {
    let registry = &Registry::new("spanner");
    let barrier = &Barrier::new(THREADS);

    let maps: Vec<Arc<FieldMap>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    barrier.wait();
                    registry.resolve::<Order>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.len(), 1);
    let first = &maps[0];
    assert!(maps.iter().all(|map| Arc::ptr_eq(first, map)));
    assert_eq!(first.len(), 3);
}

#[test]
fn test_mixed_types_under_contention() {
    let patcher = Patcher::spanner();
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for i in 0..THREADS {
            let patcher = &patcher;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    assert_eq!(
                        patcher.columns::<Order, _, _>(["total", "id"]).unwrap(),
                        "OrderId, Total"
                    );
                } else {
                    assert_eq!(patcher.all_columns::<Customer>().unwrap(), "CustomerId");
                }
            });
        }
    });

    assert_eq!(patcher.registry().len(), 2);
}

#[test]
fn test_tag_keys_do_not_collide() {
    let spanner = Patcher::spanner();
    let postgres = Patcher::postgres();

    let a = spanner.registry().resolve::<Order>().unwrap();
    let b = postgres.registry().resolve::<Order>().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.get("id").map(ColumnEntry::column), Some("OrderId"));
    assert_eq!(b.get("id").map(ColumnEntry::column), Some("order_id"));
    assert!(a.contains("notes"));
    assert!(!b.contains("notes"));
}

#[test]
fn test_resolution_is_deterministic() {
    let first = Registry::new("db").resolve::<Order>().unwrap();
    let second = Registry::new("db").resolve::<Order>().unwrap();
    assert_eq!(*first, *second);
}
