// ABOUTME: Extracts suggested follow-up questions from the final answer text
// ABOUTME: Falls back to three generic follow-ups when the answer has no usable section
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::LazyLock;

use haulsight_core::constants::answers::{
    GENERIC_FOLLOW_UPS, MAX_FOLLOW_UPS, MIN_FOLLOW_UP_CHARS,
};
use haulsight_core::models::FollowUpQuestion;
use regex::{Captures, Regex};

/// Heading line such as `## Follow-up questions:`, `**Follow up Question**`
/// or `Suggested follow-up questions: <first question>`
///
/// Text after the colon is captured as `rest`.
static HEADING_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?[ \t]*",
        r"(?:[a-z]+[ \t]+){0,3}follow[- ]?up[ \t]+questions?",
        r"[ \t]*(?:\*\*|__)?[ \t]*",
        r"(?::[ \t]*(?:\*\*|__)?(?P<rest>[^\r\n]*))?[ \t\r]*$",
    ))
    .ok()
});

/// Leading list marker: `-`, `*`, `•`, `1.` or `1)`
static LIST_MARKER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").ok());

fn strip_line(line: &str) -> String {
    let without_marker = LIST_MARKER_PATTERN
        .as_ref()
        .map_or_else(|| line.trim().to_owned(), |re| re.replace(line, "").into_owned());
    without_marker
        .replace("**", "")
        .replace("__", "")
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`' || c.is_whitespace())
        .to_owned()
}

fn numbered(questions: impl IntoIterator<Item = String>) -> Vec<FollowUpQuestion> {
    questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| FollowUpQuestion {
            id: format!("followup-{}", index + 1),
            question,
        })
        .collect()
}

/// Generic follow-ups used when the answer suggests none
#[must_use]
pub fn generic_follow_ups() -> Vec<FollowUpQuestion> {
    numbered(GENERIC_FOLLOW_UPS.iter().map(|&q| q.to_owned()))
}

fn find_heading(answer: &str) -> Option<Captures<'_>> {
    HEADING_PATTERN.as_ref().and_then(|re| re.captures(answer))
}

/// Follow-up questions on and after the answer's follow-up heading
#[must_use]
pub fn extract_follow_ups(answer: &str) -> Vec<FollowUpQuestion> {
    let Some(heading) = find_heading(answer) else {
        return generic_follow_ups();
    };
    let Some(line) = heading.get(0) else {
        return generic_follow_ups();
    };

    let inline = heading.name("rest").map(|rest| rest.as_str());
    let questions: Vec<String> = inline
        .into_iter()
        .chain(answer[line.end()..].lines())
        .map(strip_line)
        .filter(|line| line.chars().count() >= MIN_FOLLOW_UP_CHARS)
        .take(MAX_FOLLOW_UPS)
        .collect();

    if questions.is_empty() {
        generic_follow_ups()
    } else {
        numbered(questions)
    }
}

/// Answer text with the follow-up section removed
#[must_use]
pub fn strip_follow_up_section(answer: &str) -> &str {
    find_heading(answer)
        .and_then(|heading| heading.get(0))
        .map_or(answer, |line| answer[..line.start()].trim_end())
}
