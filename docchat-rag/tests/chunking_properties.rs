//! Property tests for sentence chunking.

use docchat_rag::chunking::{Chunker, SentenceChunker, chunk_text};
use proptest::prelude::*;

/// A sentence of one to five lowercase words, without its final period.
fn arb_sentence() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,8}", 1..5).prop_map(|words| words.join(" "))
}

/// Text of the form `s1. s2. ... sn.`
fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_sentence(), 1..12)
        .prop_map(|sentences| format!("{}.", sentences.join(". ")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Joining the chunks with single spaces reproduces well-formed input.
    #[test]
    fn chunks_rejoin_to_input(text in arb_text(), max in 1usize..120) {
        let chunks = chunk_text(&text, max);
        prop_assert_eq!(chunks.join(" "), text);
    }

    /// A chunk may exceed the limit only if it holds a single sentence.
    #[test]
    fn oversized_chunks_hold_one_sentence(text in arb_text(), max in 1usize..120) {
        for chunk in chunk_text(&text, max) {
            prop_assert!(
                chunk.chars().count() <= max || !chunk.contains(". "),
                "chunk {:?} exceeds {} and spans sentences",
                chunk,
                max,
            );
            prop_assert!(!chunk.trim().is_empty());
        }
    }

    /// The same input always produces the same chunks and ids.
    #[test]
    fn chunking_is_deterministic(text in ".{0,200}", max in 1usize..200) {
        let chunker = SentenceChunker::new(max);
        let first = chunker.chunk("doc", &text);
        let second = chunker.chunk("doc", &text);
        prop_assert_eq!(&first, &second);
        for (i, chunk) in first.iter().enumerate() {
            prop_assert_eq!(chunk.sequence_index, i);
            prop_assert_eq!(&chunk.id, &format!("doc_chunk_{i}"));
        }
    }
}
