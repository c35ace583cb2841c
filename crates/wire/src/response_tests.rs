// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::{CoreError, ErrorKind};

#[test]
fn error_response_is_not_success() {
    let err = CoreError::not_found("checkpoint chk-abc not found");
    let response = Response::from_error(&err);
    assert!(!response.is_success());
}

#[test]
fn ok_response_is_success() {
    assert!(Response::Ok.is_success());
}

#[test]
fn error_envelope_serializes_with_kind() {
    let err = CoreError::conflict("subdomain already taken");
    let response = Response::from_error(&err);
    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["type"], "error");
    assert_eq!(value["kind"], "conflict");
    let _ = ErrorKind::Conflict;
}
