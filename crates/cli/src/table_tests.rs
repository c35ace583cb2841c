// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn renders_header_and_padded_columns() {
    let mut table = Table::plain(vec![Column::left("NAME"), Column::right("COUNT")]);
    table.row(vec!["alpha".to_string(), "3".to_string()]);
    table.row(vec!["b".to_string(), "120".to_string()]);

    let mut out = Vec::new();
    table.render(&mut out);
    let rendered = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "NAME   COUNT");
    assert_eq!(lines[1], "alpha      3");
    assert_eq!(lines[2], "b        120");
}

#[test]
fn empty_table_renders_nothing() {
    let table = Table::plain(vec![Column::left("NAME")]);
    let mut out = Vec::new();
    table.render(&mut out);
    assert!(out.is_empty());
}

#[test]
fn truncates_to_max_width() {
    let mut table = Table::plain(vec![Column::left("DESC").with_max(4)]);
    table.row(vec!["abcdefgh".to_string()]);
    let mut out = Vec::new();
    table.render(&mut out);
    assert_eq!(String::from_utf8(out).unwrap().trim_end(), "abcd");
}
