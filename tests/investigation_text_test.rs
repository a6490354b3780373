// ABOUTME: Tests for question classification and follow-up extraction from answer text
// ABOUTME: Pins the pattern family order, default confidences and follow-up heading variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use haulsight_core::models::ProcessingMode;
use haulsight_server::investigation::followups::strip_follow_up_section;
use haulsight_server::investigation::{extract_follow_ups, generic_follow_ups, ModeClassifier};

#[test]
fn test_pattern_families_in_order() {
    let cases = [
        ("How many shipments did we move last week?", ProcessingMode::Quick, 0.9),
        ("Show me a chart of cost by carrier", ProcessingMode::Visual, 0.85),
        ("How many shipments by carrier?", ProcessingMode::Visual, 0.85),
        ("Why did our costs spike in March?", ProcessingMode::Deep, 0.8),
        ("Tell me about the shipments", ProcessingMode::Deep, 0.5),
        (
            "Tell me about our shipment operations in the northeast region and summarize the key things the team should know for this quarter please",
            ProcessingMode::Deep,
            0.6,
        ),
    ];

    for (question, mode, confidence) in cases {
        let classification = ModeClassifier::classify(question, None);
        assert_eq!(classification.detected, mode, "{question}");
        assert_eq!(classification.confidence, confidence, "{question}");
        assert!(!classification.reason.is_empty());
    }
}

#[test]
fn test_forced_mode_overrides_patterns() {
    let classification =
        ModeClassifier::classify("How many shipments?", Some(ProcessingMode::Deep));

    assert_eq!(classification.detected, ProcessingMode::Deep);
    assert_eq!(classification.confidence, 1.0);
    assert_eq!(classification.reason, "forced by caller");
}

#[test]
fn test_classification_is_deterministic() {
    let question = "Compare cost per mile between Saia and XPO over time";
    let first = ModeClassifier::classify(question, None);
    let second = ModeClassifier::classify(question, None);

    assert_eq!(first, second);
}

#[test]
fn test_follow_ups_parsed_from_numbered_and_bulleted_lines() {
    let answer = "Old Dominion carried the most spend.\n\n\
                  ## Follow-up Questions\n\
                  1. Which carrier had the most delays?\n\
                  2. ok\n\
                  - How did cost per mile change last month?\n\
                  * **What lanes grew fastest this quarter?**\n\
                  - Is there a fourth question worth asking?";

    let follow_ups = extract_follow_ups(answer);

    let questions: Vec<&str> = follow_ups.iter().map(|f| f.question.as_str()).collect();
    assert_eq!(
        questions,
        [
            "Which carrier had the most delays?",
            "How did cost per mile change last month?",
            "What lanes grew fastest this quarter?",
        ]
    );
    let ids: Vec<&str> = follow_ups.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["followup-1", "followup-2", "followup-3"]);
    assert_eq!(strip_follow_up_section(answer), "Old Dominion carried the most spend.");
}

#[test]
fn test_bold_heading_variant() {
    let answer = "Done.\n**Followup questions:**\n- Which states ship the heaviest freight?";

    let follow_ups = extract_follow_ups(answer);

    assert_eq!(follow_ups.len(), 1);
    assert_eq!(follow_ups[0].question, "Which states ship the heaviest freight?");
}

#[test]
fn test_generic_follow_ups_without_usable_section() {
    assert_eq!(extract_follow_ups("Costs were flat."), generic_follow_ups());
    assert_eq!(
        extract_follow_ups("Costs were flat.\nFollow up questions:\n- ok\n- no"),
        generic_follow_ups()
    );
    assert_eq!(generic_follow_ups().len(), 3);
}

#[test]
fn test_heading_variants_keep_the_model_suggestions() {
    let cases = [
        (
            "Old Dominion led spend.\nFollow-up questions: Which lanes cost the most?",
            "Which lanes cost the most?",
        ),
        (
            "Old Dominion led spend.\n\nSuggested follow-up questions:\n- Which lanes cost the most?",
            "Which lanes cost the most?",
        ),
        (
            "Old Dominion led spend.\n\n**Follow-up Question**\n- Which lanes cost the most?",
            "Which lanes cost the most?",
        ),
        (
            "Old Dominion led spend.\r\n**Follow-up questions:** Which lanes cost the most?\r\n",
            "Which lanes cost the most?",
        ),
    ];

    for (answer, expected) in cases {
        let follow_ups = extract_follow_ups(answer);
        assert_eq!(follow_ups.len(), 1, "{answer:?}");
        assert_eq!(follow_ups[0].question, expected, "{answer:?}");
        assert_eq!(strip_follow_up_section(answer), "Old Dominion led spend.", "{answer:?}");
    }
}

#[test]
fn test_inline_question_comes_before_listed_ones() {
    let answer = "Costs were flat.\n\
                  Here are some follow-up questions: Which carrier was cheapest?\n\
                  - Which lanes grew fastest?\n\
                  - How many shipments were late?\n\
                  - Is this one past the cap?";

    let questions: Vec<String> = extract_follow_ups(answer)
        .into_iter()
        .map(|f| f.question)
        .collect();

    assert_eq!(
        questions,
        [
            "Which carrier was cheapest?",
            "Which lanes grew fastest?",
            "How many shipments were late?",
        ]
    );
}
