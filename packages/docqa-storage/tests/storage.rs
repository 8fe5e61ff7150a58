use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;

use docqa_storage::{
	ChunkRecord, ConversationStore, Error, SourceRecord, TurnRole, VectorStore, chunk_id,
};
use docqa_testkit::TestWorkspace;

fn source(source_id: &str, hash: &str, chunk_count: u32) -> SourceRecord {
	SourceRecord {
		source_id: source_id.to_string(),
		content_hash: hash.to_string(),
		chunk_count,
		ingested_at: OffsetDateTime::now_utc(),
	}
}

fn chunk(source_id: &str, chunk_index: u32, text: &str, embedding: Vec<f32>) -> ChunkRecord {
	ChunkRecord {
		chunk_id: chunk_id(source_id, chunk_index),
		source_id: source_id.to_string(),
		chunk_index,
		start_offset: 0,
		end_offset: text.len(),
		text: text.to_string(),
		embedding,
	}
}

#[tokio::test]
async fn search_ranks_by_cosine_similarity() {
	let store = VectorStore::in_memory();

	store
		.replace_source(source("jane.pdf", "h1", 2), vec![
			chunk("jane.pdf", 0, "Jane writes Rust.", vec![1.0, 0.0, 0.0]),
			chunk("jane.pdf", 1, "Jane lives in Cairo.", vec![0.0, 1.0, 0.0]),
		])
		.await
		.expect("Failed to insert jane.pdf.");
	store
		.replace_source(source("omar.pdf", "h2", 1), vec![chunk(
			"omar.pdf",
			0,
			"Omar writes Go.",
			vec![0.7, 0.7, 0.0],
		)])
		.await
		.expect("Failed to insert omar.pdf.");

	let hits = store.search(&[1.0, 0.1, 0.0], 2).await.expect("Search failed.");

	assert_eq!(hits.len(), 2);
	assert_eq!(hits[0].text, "Jane writes Rust.");
	assert_eq!(hits[1].source_id, "omar.pdf");
	assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn replacing_a_source_drops_its_old_chunks() {
	let store = VectorStore::in_memory();

	store
		.replace_source(source("jane.pdf", "old", 2), vec![
			chunk("jane.pdf", 0, "old zero", vec![1.0, 0.0]),
			chunk("jane.pdf", 1, "old one", vec![0.0, 1.0]),
		])
		.await
		.expect("Failed to insert.");
	store
		.replace_source(source("jane.pdf", "new", 1), vec![chunk(
			"jane.pdf",
			0,
			"new zero",
			vec![1.0, 1.0],
		)])
		.await
		.expect("Failed to replace.");

	assert_eq!(store.len().await, 1);
	assert_eq!(store.source_hash("jane.pdf").await.as_deref(), Some("new"));

	let hits = store.search(&[1.0, 1.0], 10).await.expect("Search failed.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].text, "new zero");
}

#[tokio::test]
async fn mismatched_dimensions_are_rejected() {
	let store = VectorStore::in_memory();

	store
		.replace_source(source("a.pdf", "h", 1), vec![chunk("a.pdf", 0, "a", vec![1.0, 0.0])])
		.await
		.expect("Failed to insert.");

	let err = store
		.replace_source(source("b.pdf", "h", 1), vec![chunk("b.pdf", 0, "b", vec![1.0, 0.0, 0.0])])
		.await
		.expect_err("Expected dimension mismatch.");

	assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));

	let err = store.search(&[1.0], 1).await.expect_err("Expected dimension mismatch.");

	assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
}

#[tokio::test]
async fn duplicate_chunk_identity_is_rejected() {
	let store = VectorStore::in_memory();
	let err = store
		.replace_source(source("a.pdf", "h", 2), vec![
			chunk("a.pdf", 0, "a", vec![1.0]),
			chunk("a.pdf", 0, "b", vec![1.0]),
		])
		.await
		.expect_err("Expected duplicate rejection.");

	assert!(matches!(err, Error::InvalidArgument(_)));
	assert!(store.is_empty().await);
}

#[tokio::test]
async fn persisted_index_reopens_with_same_contents() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let path = workspace.path("nested/index.json");
	let store = VectorStore::open(Some(path.as_path())).expect("Failed to open store.");

	assert!(store.is_empty().await);

	store
		.replace_source(source("jane.pdf", "h1", 1), vec![chunk(
			"jane.pdf",
			0,
			"Jane writes Rust.",
			vec![0.5, 0.5],
		)])
		.await
		.expect("Failed to insert.");
	store.persist().await.expect("Failed to persist.");

	let reopened = VectorStore::open(Some(path.as_path())).expect("Failed to reopen store.");
	let sources = reopened.sources().await;

	assert_eq!(sources.len(), 1);
	assert_eq!(sources[0].content_hash, "h1");
	assert_eq!(
		reopened.search(&[1.0, 1.0], 1).await.expect("Search failed.")[0].chunk_id,
		chunk_id("jane.pdf", 0)
	);

	let leftovers = std::fs::read_dir(workspace.path("nested")).expect("Failed to list dir.").count();

	assert_eq!(leftovers, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_persists_all_succeed() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let path = workspace.index_path();
	let store = Arc::new(VectorStore::open(Some(path.as_path())).expect("Failed to open store."));

	for idx in 0..50 {
		let source_id = format!("cv-{idx}.pdf");

		store
			.replace_source(source(&source_id, "h", 1), vec![chunk(
				&source_id,
				0,
				"Rust engineer.",
				vec![1.0, idx as f32],
			)])
			.await
			.expect("Failed to insert.");
	}

	let handles = (0..64)
		.map(|_| {
			let store = store.clone();

			tokio::spawn(async move { store.persist().await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Persist task panicked.").expect("Persist failed.");
	}

	let reopened = VectorStore::open(Some(path.as_path())).expect("Failed to reopen store.");

	assert_eq!(reopened.sources().await.len(), 50);
	assert_eq!(std::fs::read_dir(workspace.root()).expect("Failed to list dir.").count(), 1);
}

#[tokio::test]
async fn corrupt_snapshot_is_reported() {
	let workspace = TestWorkspace::new().expect("Failed to create workspace.");
	let path = workspace.write("index.json", b"{ not json").expect("Failed to write snapshot.");
	let err = VectorStore::open(Some(path.as_path())).err().expect("Expected snapshot error.");

	assert!(matches!(err, Error::Snapshot { .. }));
}

#[tokio::test]
async fn same_user_requests_are_serialized() {
	let store = Arc::new(ConversationStore::new(None));
	let mut handles = Vec::new();

	for idx in 0..4 {
		let store = store.clone();

		handles.push(tokio::spawn(async move {
			let session = store.session("u1");
			let mut conversation = session.lock().await;

			conversation.push(TurnRole::User, format!("q{idx}"));
			tokio::time::sleep(Duration::from_millis(5)).await;
			conversation.push(TurnRole::Assistant, format!("a{idx}"));
		}));
	}

	for handle in handles {
		handle.await.expect("Task panicked.");
	}

	let turns = store.snapshot("u1").await;

	assert_eq!(turns.len(), 8);

	for pair in turns.chunks(2) {
		assert_eq!(pair[0].role, TurnRole::User);
		assert_eq!(pair[1].role, TurnRole::Assistant);
		assert_eq!(pair[0].text[1..], pair[1].text[1..]);
	}
}

#[tokio::test]
async fn users_are_isolated() {
	let store = ConversationStore::new(Some(5));

	store.session("alice").lock().await.record_exchange("Hello, who are you?", "An assistant.");

	assert!(store.snapshot("bob").await.is_empty());
	assert_eq!(store.snapshot("alice").await.len(), 2);
	assert!(store.reset("alice").await);
	assert!(!store.reset("bob").await);
	assert!(store.snapshot("alice").await.is_empty());
	assert_eq!(store.users(), vec!["alice".to_string()]);
}
