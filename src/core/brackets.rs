/// Bracket syntax: conversion between a sentence's editable text and its content list.
///
/// Syntax:
/// - `[noun]` → blank with part of speech `noun`
/// - `[verb:past tense]` → blank with a hint; only the first `:` splits
/// - `[[` / `]]` → literal `[` / `]`
/// - an unmatched `[` or `]` stays literal text

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::core::ids::IdSource;
use crate::schema::blank::Blank;
use crate::schema::content::{BlankItem, ContentItem, ItemId, blank_items};

/// A character of input after escape protection. Escaped brackets become
/// their own tokens so span detection cannot see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Char(char),
    OpenLiteral,
    CloseLiteral,
}

/// A run of the protected input: plain text or a `[...]` span (brackets stripped).
#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Text(&'a [Token]),
    Span(&'a [Token]),
}

/// Render a content list in its editable form.
///
/// Inverse of [`parse`] for lists that came from `parse`, as long as no
/// part of speech or hint contains `:`, `[` or `]`.
pub fn serialize(content: &[ContentItem]) -> String {
    let mut out = String::new();
    for item in content {
        match item {
            ContentItem::Text(text) => {
                for c in text.text.chars() {
                    match c {
                        '[' => out.push_str("[["),
                        ']' => out.push_str("]]"),
                        c => out.push(c),
                    }
                }
            }
            ContentItem::Blank(BlankItem { blank, .. }) => {
                out.push('[');
                out.push_str(&blank.part_of_speech);
                if let Some(hint) = &blank.hint {
                    out.push(':');
                    out.push_str(hint);
                }
                out.push(']');
            }
        }
    }
    out
}

/// Parse edited text into a content list.
///
/// The Nth blank in `input` keeps the id of the Nth blank in `previous` when
/// the two are equal; every other item gets a fresh id from `ids`. Matching
/// is by position, so inserting a blank ahead of others renumbers those
/// that follow it.
///
/// Fresh ids never repeat an id already present in `previous` or one minted
/// earlier in the same call, even when `ids` replays an old sequence.
///
/// Never fails. `[]` yields a blank with an empty part of speech, which is
/// left for commit-time validation to reject.
pub fn parse(input: &str, previous: &[ContentItem], ids: &mut dyn IdSource) -> Vec<ContentItem> {
    let tokens = protect(input);
    let mut previous_blanks = blank_items(previous);
    let mut taken: FxHashSet<String> = previous.iter().map(|c| c.id().to_string()).collect();
    let mut content = Vec::new();

    for run in split_runs(&tokens) {
        match run {
            Run::Text(tokens) => {
                let text = restore(tokens);
                if !text.is_empty() {
                    content.push(ContentItem::text(unused_id(ids, "text", &mut taken), text));
                }
            }
            Run::Span(inner) => {
                let blank = candidate_blank(&restore(inner));
                let id = match previous_blanks.next() {
                    Some(prior) if prior.blank.same_as(&blank) => prior.id.clone(),
                    _ => ItemId(unused_id(ids, "blank", &mut taken)),
                };
                content.push(ContentItem::blank(id, blank));
            }
        }
    }

    trace!(items = content.len(), "parsed sentence text");
    content
}

fn unused_id(ids: &mut dyn IdSource, prefix: &str, taken: &mut FxHashSet<String>) -> String {
    loop {
        let id = ids.next_id(prefix);
        if taken.insert(id.clone()) {
            return id;
        }
    }
}

fn protect(input: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '[' if chars.peek() == Some(&'[') => {
                chars.next();
                tokens.push(Token::OpenLiteral);
            }
            ']' if chars.peek() == Some(&']') => {
                chars.next();
                tokens.push(Token::CloseLiteral);
            }
            c => tokens.push(Token::Char(c)),
        }
    }
    tokens
}

/// Split into alternating text runs and bracket spans, in order. A span runs
/// from a `[` to the first `]` after it; empty text runs are not emitted.
fn split_runs(tokens: &[Token]) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i] == Token::Char('[') {
            let close = tokens[i + 1..]
                .iter()
                .position(|t| *t == Token::Char(']'))
                .map(|offset| i + 1 + offset);
            match close {
                Some(close) => {
                    if text_start < i {
                        runs.push(Run::Text(&tokens[text_start..i]));
                    }
                    runs.push(Run::Span(&tokens[i + 1..close]));
                    i = close + 1;
                    text_start = i;
                    continue;
                }
                // no `]` anywhere after this point, so no later span either
                None => break,
            }
        }
        i += 1;
    }

    if text_start < tokens.len() {
        runs.push(Run::Text(&tokens[text_start..]));
    }
    runs
}

fn restore(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| match t {
            Token::Char(c) => *c,
            Token::OpenLiteral => '[',
            Token::CloseLiteral => ']',
        })
        .collect()
}

fn candidate_blank(inner: &str) -> Blank {
    match inner.split_once(':') {
        Some((part_of_speech, hint)) => Blank::draft(part_of_speech, Some(hint)),
        None => Blank::draft(inner, None),
    }
}
