// ABOUTME: Integration tests for the message turn orchestrator
// ABOUTME: Covers degradations, fatal reply failures, cancellation, and concurrent sequencing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use common::{
    create_test_database, create_test_orchestrator, default_capabilities, test_timeouts,
    FailingReplyGenerator, FailingSynthesizer, RecordingReplyGenerator, ScriptedTranscriber,
    SlowReplyGenerator, SlowSynthesizer, SlowTranscriber,
};
use futures_util::future::join_all;
use voxloom_server::capabilities::{NullSynthesizer, PlaceholderTranscriber, RuleBasedReplyGenerator};
use voxloom_server::content_store::InMemoryContentStore;
use voxloom_server::constants::transcripts::{EMPTY_TRANSCRIPT, PENDING_REAL_MODEL};
use voxloom_server::errors::{CapabilityError, ErrorCode};
use voxloom_server::models::{
    Direction, Modality, ModelCallKind, ModelCallStatus, ToolCallStatus,
};
use voxloom_server::services::{
    Degradation, InboundPayload, MessageTurnOrchestrator, TurnCapabilities,
};

fn text(value: &str) -> InboundPayload {
    InboundPayload::Text(value.to_owned())
}

fn audio() -> InboundPayload {
    InboundPayload::Audio {
        bytes: Bytes::from_static(b"RIFF....WAVEfmt fake audio"),
        mime: "audio/wav".to_owned(),
    }
}

#[tokio::test]
async fn test_refund_text_turn_replies_and_captures_crm() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_123", "en", "web", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    let turn = orchestrator
        .handle_turn(&session.id, text("Hi, I want a refund for my last bill"))
        .await
        .unwrap();

    assert_eq!(turn.inbound.seq, 1);
    assert_eq!(turn.outbound.seq, 2);
    assert_eq!(turn.outbound.direction, Direction::Outbound);
    assert!(turn.reply_text().contains("refund"));
    assert!(turn.degradations.is_empty());

    let kinds: Vec<_> = turn.model_calls.iter().map(|call| call.kind).collect();
    assert_eq!(kinds, vec![ModelCallKind::Llm, ModelCallKind::Tts]);
    assert!(turn
        .model_calls
        .iter()
        .all(|call| call.status == ModelCallStatus::Success && call.message_id == turn.inbound.id));
    assert!(turn.reply_audio_ref().is_some_and(|r| r.ends_with(".wav")));

    let tool_call = turn.tool_call.as_ref().unwrap();
    let crm = turn.crm_record.as_ref().unwrap();
    assert_eq!(tool_call.status, ToolCallStatus::Completed);
    assert_eq!(tool_call.crm_record_id.as_deref(), Some(crm.id.as_str()));
    assert_eq!(tool_call.triggering_message_id.as_deref(), Some(turn.inbound.id.as_str()));
    assert!(crm.created_at < tool_call.created_at);
    assert_eq!(crm.intent, "request_refund");
    assert_eq!(crm.priority, "high");
    assert_eq!(crm.name, "cust_123");
    assert_eq!(crm.account_id, format!("acc_{}", &session.id[..8]));
    assert!(turn.summary().contains("CRM record"));
}

#[tokio::test]
async fn test_audio_turn_records_transcription() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    let turn = orchestrator.handle_turn(&session.id, audio()).await.unwrap();

    assert_eq!(turn.inbound.modality, Modality::Audio);
    assert!(turn.inbound.content_ref.as_deref().is_some_and(|r| r.ends_with(".wav")));
    assert_eq!(turn.inbound.derived_text.as_deref(), Some(PENDING_REAL_MODEL));
    assert_eq!(turn.model_calls[0].kind, ModelCallKind::Asr);
    assert_eq!(turn.model_calls[0].status, ModelCallStatus::Success);

    let stored = db.get_message(&turn.inbound.id).await.unwrap().unwrap();
    assert_eq!(stored.derived_text.as_deref(), Some(PENDING_REAL_MODEL));
}

#[tokio::test]
async fn test_failed_transcription_degrades_to_fallback_transcript() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        transcriber: Arc::new(ScriptedTranscriber {
            outcome: Err(CapabilityError::failed("decoder crashed")),
        }),
        ..default_capabilities(store)
    });

    let turn = orchestrator.handle_turn(&session.id, audio()).await.unwrap();

    let asr = &turn.model_calls[0];
    assert_eq!(asr.kind, ModelCallKind::Asr);
    assert_eq!(asr.status, ModelCallStatus::Failure);
    assert_eq!(asr.status_code.as_deref(), Some("adapter_error"));
    assert_eq!(turn.inbound.derived_text.as_deref(), Some(EMPTY_TRANSCRIPT));
    assert_eq!(
        turn.degradations,
        vec![Degradation::Transcription {
            status_code: "adapter_error".to_owned()
        }]
    );
    assert!(turn.reply_text().contains("repeat"));
    assert!(turn.tool_call.is_none());
}

#[tokio::test]
async fn test_reply_failure_aborts_turn_but_keeps_audit_trail() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        reply_generator: Arc::new(FailingReplyGenerator),
        ..default_capabilities(store)
    });

    let error = orchestrator
        .handle_turn(&session.id, audio())
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ReplyGenerationFailed);
    assert_eq!(error.http_status(), 502);

    let conversation = db.get_conversation(&session.id).await.unwrap();
    assert_eq!(conversation.messages.len(), 1);
    let inbound = &conversation.messages[0];
    assert_eq!(error.details["inbound_message_id"], inbound.id.as_str());
    assert_eq!(error.details["model_call_ids"].as_array().unwrap().len(), 3);

    let calls: Vec<_> = conversation
        .model_calls
        .iter()
        .map(|call| (call.kind, call.status))
        .collect();
    assert_eq!(
        calls,
        vec![
            (ModelCallKind::Asr, ModelCallStatus::Success),
            (ModelCallKind::Llm, ModelCallStatus::Failure),
            (ModelCallKind::Tts, ModelCallStatus::Skipped),
        ]
    );
    assert_eq!(
        conversation.model_calls[2].status_code.as_deref(),
        Some("upstream_failed")
    );
}

#[tokio::test]
async fn test_reply_timeout_is_recorded_as_timeout() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "web", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        reply_generator: Arc::new(SlowReplyGenerator {
            delay: Duration::from_secs(10),
        }),
        ..default_capabilities(store)
    });

    let error = orchestrator
        .handle_turn(&session.id, text("hello"))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ReplyGenerationFailed);
    assert_eq!(error.details["status_code"], "timeout");

    let conversation = db.get_conversation(&session.id).await.unwrap();
    let llm = conversation
        .model_calls
        .iter()
        .find(|call| call.kind == ModelCallKind::Llm)
        .unwrap();
    assert_eq!(llm.status, ModelCallStatus::Failure);
    assert_eq!(llm.status_code.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn test_transcription_timeout_degrades_turn() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        transcriber: Arc::new(SlowTranscriber {
            delay: Duration::from_secs(10),
        }),
        ..default_capabilities(store)
    });

    let turn = orchestrator
        .handle_turn(&session.id, audio())
        .await
        .unwrap();

    let asr = &turn.model_calls[0];
    assert_eq!(asr.kind, ModelCallKind::Asr);
    assert_eq!(asr.status, ModelCallStatus::Failure);
    assert_eq!(asr.status_code.as_deref(), Some("timeout"));
    assert_eq!(turn.user_text(), EMPTY_TRANSCRIPT);
    assert_eq!(
        turn.degradations,
        vec![Degradation::Transcription {
            status_code: "timeout".to_owned()
        }]
    );
    assert!(!turn.reply_text().is_empty());
    assert_eq!(turn.outbound.seq, 2);
}

#[tokio::test]
async fn test_synthesis_timeout_degrades_turn() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "chat", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        synthesizer: Arc::new(SlowSynthesizer {
            delay: Duration::from_secs(10),
        }),
        ..default_capabilities(store)
    });

    let turn = orchestrator
        .handle_turn(&session.id, text("hello"))
        .await
        .unwrap();

    let tts = turn.model_calls.last().unwrap();
    assert_eq!(tts.kind, ModelCallKind::Tts);
    assert_eq!(tts.status, ModelCallStatus::Failure);
    assert_eq!(tts.status_code.as_deref(), Some("timeout"));
    assert_eq!(
        turn.degradations,
        vec![Degradation::Synthesis {
            status_code: "timeout".to_owned()
        }]
    );
    assert!(turn.reply_audio_ref().is_none());
    assert_eq!(turn.outbound.text.as_deref(), Some(turn.reply_text()));
}

#[tokio::test]
async fn test_resent_audio_reuses_stored_blob() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let store = InMemoryContentStore::new();
    let orchestrator = MessageTurnOrchestrator::new(
        db.clone(),
        Arc::new(store.clone()),
        TurnCapabilities {
            transcriber: Arc::new(SlowTranscriber {
                delay: Duration::from_secs(10),
            }),
            reply_generator: Arc::new(RuleBasedReplyGenerator),
            synthesizer: Arc::new(NullSynthesizer),
        },
        test_timeouts(),
        1024 * 1024,
    );

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        orchestrator.handle_turn(&session.id, audio()),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(store.len(), 1);

    let turn = orchestrator
        .handle_turn(&session.id, audio())
        .await
        .unwrap();
    assert_eq!(store.len(), 1);

    let messages = db.list_messages(&session.id).await.unwrap();
    assert_eq!(messages[0].content_ref, turn.inbound.content_ref);
}

#[tokio::test]
async fn test_cancelled_turn_keeps_committed_writes() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "web", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        reply_generator: Arc::new(SlowReplyGenerator {
            delay: Duration::from_secs(10),
        }),
        ..default_capabilities(store)
    });

    let cancelled = tokio::time::timeout(
        Duration::from_millis(200),
        orchestrator.handle_turn(&session.id, text("hello there")),
    )
    .await;
    assert!(cancelled.is_err());

    let conversation = db.get_conversation(&session.id).await.unwrap();
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].direction, Direction::Inbound);
    assert!(conversation.model_calls.is_empty());

    let next = create_test_orchestrator(&db, default_capabilities)
        .handle_turn(&session.id, text("are you there?"))
        .await
        .unwrap();
    assert_eq!(next.inbound.seq, 2);
}

#[tokio::test]
async fn test_concurrent_turns_get_gap_free_sequence_numbers() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "web", None).await.unwrap();
    let other = db.create_session("cust_2", "en", "web", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    let turns = (0..8).map(|i| {
        let orchestrator = orchestrator.clone();
        let session_id = if i % 4 == 0 { other.id.clone() } else { session.id.clone() };
        tokio::spawn(async move {
            orchestrator
                .handle_turn(&session_id, InboundPayload::Text(format!("question {i}")))
                .await
        })
    });
    for result in join_all(turns).await {
        result.unwrap().unwrap();
    }

    for (session_id, expected) in [(&session.id, 12_i64), (&other.id, 4_i64)] {
        let seqs: Vec<i64> = db
            .list_messages(session_id)
            .await
            .unwrap()
            .iter()
            .map(|message| message.seq)
            .collect();
        assert_eq!(seqs, (1..=expected).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn test_no_audio_synthesizer_is_a_successful_tts_call() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "chat", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |_store| TurnCapabilities {
        transcriber: Arc::new(PlaceholderTranscriber),
        reply_generator: Arc::new(RuleBasedReplyGenerator),
        synthesizer: Arc::new(NullSynthesizer),
    });

    let turn = orchestrator
        .handle_turn(&session.id, text("Why is my invoice so high?"))
        .await
        .unwrap();

    let tts = turn.model_calls.last().unwrap();
    assert_eq!(tts.kind, ModelCallKind::Tts);
    assert_eq!(tts.status, ModelCallStatus::Success);
    assert!(tts.output_summary.is_none());
    assert_eq!(turn.outbound.modality, Modality::Text);
    assert!(turn.reply_audio_ref().is_none());
    assert!(turn.degradations.is_empty());
    assert!(turn.summary().contains("no reply audio produced"));
    assert_eq!(turn.crm_record.unwrap().intent, "billing_explanation");
}

#[tokio::test]
async fn test_synthesis_failure_degrades_to_text_reply() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "chat", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, |store| TurnCapabilities {
        synthesizer: Arc::new(FailingSynthesizer),
        ..default_capabilities(store)
    });

    let turn = orchestrator
        .handle_turn(&session.id, text("hello"))
        .await
        .unwrap();

    let tts = turn.model_calls.last().unwrap();
    assert_eq!(tts.status, ModelCallStatus::Failure);
    assert_eq!(turn.outbound.modality, Modality::Text);
    assert_eq!(turn.outbound.text.as_deref(), Some(turn.reply_text()));
    assert!(turn.summary().contains("audio synthesis unavailable"));
}

#[tokio::test]
async fn test_reply_context_includes_earlier_messages() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "chat", None).await.unwrap();
    let recorder = Arc::new(RecordingReplyGenerator::default());
    let generator = Arc::clone(&recorder);
    let orchestrator = create_test_orchestrator(&db, move |store| TurnCapabilities {
        reply_generator: generator,
        ..default_capabilities(store)
    });

    orchestrator.handle_turn(&session.id, text("first")).await.unwrap();
    orchestrator.handle_turn(&session.id, text("second")).await.unwrap();

    let contexts = recorder.contexts.lock().unwrap();
    assert!(contexts[0].history.is_empty());
    let history: Vec<_> = contexts[1]
        .history
        .iter()
        .map(|entry| (entry.direction, entry.text.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![(Direction::Inbound, "first"), (Direction::Outbound, "echo: first")]
    );
    assert_eq!(contexts[1].user_text, "second");
}

#[tokio::test]
async fn test_unknown_session_persists_nothing() {
    let db = create_test_database().await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    let error = orchestrator
        .handle_turn("no-such-session", text("hello"))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::SessionNotFound);
    assert!(db.list_messages("no-such-session").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_audio_is_invalid() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    let error = orchestrator
        .handle_turn(
            &session.id,
            InboundPayload::Audio {
                bytes: Bytes::from(vec![0_u8; 2 * 1024 * 1024]),
                mime: "audio/wav".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidPayload);
    assert!(db.list_messages(&session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_conversation_counts_after_several_turns() {
    let db = create_test_database().await.unwrap();
    let session = db.create_session("cust_1", "en", "phone", None).await.unwrap();
    let orchestrator = create_test_orchestrator(&db, default_capabilities);

    orchestrator.handle_turn(&session.id, audio()).await.unwrap();
    orchestrator.handle_turn(&session.id, text("what is this fee?")).await.unwrap();
    orchestrator.handle_turn(&session.id, text("thanks")).await.unwrap();

    let first = db.get_conversation(&session.id).await.unwrap();
    let second = db.get_conversation(&session.id).await.unwrap();
    assert_eq!(first, second);

    let inbound: Vec<_> = first
        .messages
        .iter()
        .filter(|message| message.direction == Direction::Inbound)
        .collect();
    assert_eq!(inbound.len(), 3);
    assert_eq!(first.messages.len(), 6);

    for message in &inbound {
        let kinds: Vec<_> = first.model_calls_for(&message.id).map(|call| call.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == ModelCallKind::Llm).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == ModelCallKind::Tts).count(), 1);
        if message.modality == Modality::Audio {
            assert!(kinds.contains(&ModelCallKind::Asr));
        }
    }
    assert_eq!(first.tool_calls.len(), 1);
    assert_eq!(first.crm_records.len(), 1);
}
