// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn allocates_within_range_and_is_idempotent() {
    let allocator = SystemPortAllocator::new(3100, 3110);
    let first = allocator.get_or_allocate("consilio", "web").await.unwrap();
    let second = allocator.get_or_allocate("consilio", "web").await.unwrap();
    assert_eq!(first, second);
    assert!((3100..=3110).contains(&first));
}

#[tokio::test]
async fn exhausted_range_errors() {
    let allocator = SystemPortAllocator::new(3100, 3100);
    allocator.get_or_allocate("a", "svc1").await.unwrap();
    let err = allocator.get_or_allocate("b", "svc2").await.unwrap_err();
    assert!(matches!(err, PortError::NoRangeForProject(_)));
}

#[tokio::test]
async fn release_frees_the_assignment_key() {
    let allocator = SystemPortAllocator::new(3100, 3101);
    let port = allocator.get_or_allocate("a", "svc").await.unwrap();
    allocator.release("a", "svc").await.unwrap();
    assert!(allocator.list(Some("a")).await.unwrap().is_empty());
    let reallocated = allocator.get_or_allocate("a", "svc2").await.unwrap();
    assert_ne!(port, 0);
    assert!((3100..=3101).contains(&reallocated));
}
