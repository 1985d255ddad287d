use application::ingest_service::itinerary_entries;
use application::rag_service::AnswerSettings;
use domain::models::{RecordMetadata, VectorRecord};
use domain::prompt::SYSTEM_INSTRUCTION;
use domain::session::Role;
use infrastructure::itinerary_loader::load_itinerary;
use infrastructure::vector_store::VectorStore;
use std::collections::HashSet;
use tests::{single_flight, fixture_path, Harness, HashEmbedder, ONE_PASSENGER};

#[tokio::test]
async fn one_flight_one_segment_yields_flight_and_segment_records() {
    let harness = Harness::new(HashEmbedder::default(), "ok").await.unwrap();
    let report = harness
        .ingest_service()
        .ingest(&single_flight(ONE_PASSENGER))
        .await
        .unwrap();

    assert_eq!(report.flights, 1);
    assert_eq!(report.segments, 1);
    assert_eq!(report.passengers, 1);

    let stored = harness.stored().await.unwrap();
    let flight = stored.iter().find(|(id, _)| id == "T1").expect("flight record");
    assert!(flight.1.contains("NYC") && flight.1.contains("LAX"));
    let segment = stored.iter().find(|(id, _)| id == "T1-AA100").expect("segment record");
    assert!(segment.1.contains("AA100"));
    assert!(stored.iter().any(|(id, _)| id == "T1-AA100-12A"));
}

#[tokio::test]
async fn segment_without_passengers_writes_no_passenger_record() {
    let harness = Harness::new(HashEmbedder::default(), "ok").await.unwrap();
    let report = harness.ingest_service().ingest(&single_flight("[]")).await.unwrap();

    assert_eq!(report.passengers, 0);
    assert_eq!(report.keys, vec!["T1".to_string(), "T1-AA100".to_string()]);
    assert_eq!(harness.store.count().unwrap(), 2);
    assert_eq!(harness.embedder.calls(), 2);
}

#[tokio::test]
async fn reingesting_converges_instead_of_duplicating() {
    let harness = Harness::new(HashEmbedder::default(), "ok").await.unwrap();
    let document = load_itinerary(fixture_path()).unwrap();
    let service = harness.ingest_service();

    let first = service.ingest(&document).await.unwrap();
    let before = harness.stored().await.unwrap();
    let second = service.ingest(&document).await.unwrap();
    let after = harness.stored().await.unwrap();

    assert_eq!(first.keys, second.keys);
    assert_eq!(before, after);
    assert_eq!(harness.store.count().unwrap(), first.total());
}

#[tokio::test]
async fn fixture_keys_are_unique_and_complete() {
    let document = load_itinerary(fixture_path()).unwrap();
    let entries = itinerary_entries(&document);
    // 2 flights, 3 segments, 4 passengers.
    assert_eq!(entries.len(), 9);
    let keys: HashSet<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys.len(), entries.len());
    assert!(keys.contains("TK%2D4471-QR702-23A"));
    assert!(keys.contains("88213-SQ636"));
}

#[tokio::test]
async fn failed_ingestion_keeps_earlier_records() {
    let harness = Harness::new(HashEmbedder::failing_on(3), "ok").await.unwrap();
    let err = harness
        .ingest_service()
        .ingest(&single_flight(ONE_PASSENGER))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("rate limited"));
    assert_eq!(harness.store.count().unwrap(), 2);
}

#[tokio::test]
async fn answer_uses_retrieved_records_and_trims_reply() {
    let harness = Harness::new(HashEmbedder::default(), "  You are in seat 12A.\n").await.unwrap();
    harness
        .ingest_service()
        .ingest(&single_flight(ONE_PASSENGER))
        .await
        .unwrap();

    let rag = harness.rag_service(AnswerSettings::default());
    let answer = rag.answer_detailed("What's my seat for the first flight?").await.unwrap();

    assert_eq!(answer.response, "You are in seat 12A.");
    assert_eq!(answer.matches.len(), 3);
    assert!(answer.prompt.starts_with("User Query: What's my seat for the first flight?\nRelevant Information:\n"));
    assert!(answer.prompt.contains("Ada Lovelace is seated in 12A"));

    let exchanges = harness.chat.exchanges();
    assert_eq!(exchanges.len(), 1);
    let (messages, max_tokens) = &exchanges[0];
    assert_eq!(*max_tokens, 1024);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, answer.prompt);

    assert!(!rag.answer("Where do I land?").await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_store_still_asks_the_model() {
    let harness = Harness::new(HashEmbedder::default(), "I could not find your booking.").await.unwrap();
    let rag = harness.rag_service(AnswerSettings::default());

    let answer = rag.answer_detailed("What's my seat for the first flight?").await.unwrap();

    assert!(answer.matches.is_empty());
    assert!(answer.prompt.contains("Relevant Information:\n\nProvide a user-friendly response"));
    assert_eq!(answer.response, "I could not find your booking.");
    assert_eq!(harness.chat.exchanges().len(), 1);
}

#[tokio::test]
async fn top_k_and_budget_bound_the_context() {
    let harness = Harness::new(HashEmbedder::default(), "ok").await.unwrap();
    let document = load_itinerary(fixture_path()).unwrap();
    harness.ingest_service().ingest(&document).await.unwrap();

    let rag = harness.rag_service(AnswerSettings {
        top_k: 2,
        max_tokens: 64,
        context_char_budget: None,
    });
    let answer = rag.answer_detailed("Which seat does Maya Iyer have?").await.unwrap();
    assert_eq!(answer.matches.len(), 2);
    assert_eq!(harness.chat.exchanges()[0].1, 64);

    let rag = harness.rag_service(AnswerSettings {
        top_k: 5,
        max_tokens: 64,
        context_char_budget: Some(20),
    });
    let answer = rag.answer_detailed("Which seat does Maya Iyer have?").await.unwrap();
    let context = answer
        .prompt
        .split("Relevant Information:\n")
        .nth(1)
        .and_then(|rest| rest.split("\nProvide a user-friendly response").next())
        .unwrap();
    assert_eq!(context.chars().count(), 20);
}

#[tokio::test]
async fn records_from_older_formats_are_still_served() {
    let harness = Harness::new(HashEmbedder::default(), "ok").await.unwrap();
    let text = "Legacy note: seat 99Z";
    harness
        .store
        .upsert(&[VectorRecord {
            id: "legacy".into(),
            values: HashEmbedder::vector_for(text),
            metadata: RecordMetadata {
                text: text.into(),
                kind: None,
                format_version: None,
            },
        }])
        .await
        .unwrap();

    let answer = harness
        .rag_service(AnswerSettings::default())
        .answer_detailed("legacy seat")
        .await
        .unwrap();
    assert!(answer.prompt.contains(text));
}
