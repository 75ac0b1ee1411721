use pretty_assertions::assert_eq;
use rag_core::chunking::{clean_text, TextSplitter};

#[test]
fn chunks_respect_the_size_bound() {
    let splitter = TextSplitter::new(50, 10).expect("splitter");
    let text = "This is a test. ".repeat(20);
    let chunks = splitter.split(&text);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= 50,
            "chunk too long: {:?}",
            chunk
        );
        assert!(!chunk.is_empty());
    }
}

#[test]
fn empty_and_whitespace_input_produce_no_chunks() {
    let splitter = TextSplitter::new(50, 10).expect("splitter");
    assert_eq!(splitter.split(""), Vec::<String>::new());
    assert_eq!(splitter.split("   \n\t  "), Vec::<String>::new());
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    for (size, overlap) in [(50, 50), (50, 60), (1, 1)] {
        let err = TextSplitter::new(size, overlap).expect_err("should reject");
        assert_eq!(err.code, "CHUNKING_INVALID_CONFIG");
    }
}

#[test]
fn text_smaller_than_chunk_size_is_a_single_chunk() {
    let splitter = TextSplitter::new(100, 10).expect("splitter");
    let text = "This is a small text.";
    let chunks = splitter.split(text);
    assert_eq!(chunks, vec![text.to_string()]);
}

#[test]
fn short_text_with_spaces_round_trips_as_one_chunk() {
    // The merge step rejoins pieces with the separator they were split on,
    // so a text that fits in one chunk comes back verbatim.
    let splitter = TextSplitter::new(1000, 200).expect("splitter");
    let text = "A. A. A.";
    let chunks = splitter.split(text);
    assert_eq!(chunks, vec![text.to_string()]);
}

#[test]
fn consecutive_chunks_share_an_overlap() {
    let splitter = TextSplitter::new(50, 10).expect("splitter");
    let text = "word ".repeat(50);
    let chunks = splitter.split(&text);

    assert!(chunks.len() > 1);
    for pair in chunks.windows(2) {
        let overlap_prefix: String = pair[1].chars().take(10).collect();
        assert!(!overlap_prefix.is_empty());
        // The next chunk opens with the trailing characters of the previous
        // chunk plus its separator.
        let padded = format!("{} ", pair[0]);
        assert!(
            padded.ends_with(&overlap_prefix),
            "no overlap between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn atomic_unit_longer_than_chunk_size_is_emitted_whole() {
    // Only non-empty separators: nothing can subdivide the long token, so it
    // must come through unbroken even though it exceeds the bound.
    let splitter =
        TextSplitter::with_separators(50, 10, vec![" ".to_string()]).expect("splitter");
    let token = "x".repeat(100);
    let text = format!("small {token} tail");
    let chunks = splitter.split(&text);

    assert!(chunks.contains(&token));
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 50 || *chunk == token);
    }
}

#[test]
fn character_level_splitting_counts_characters_not_bytes() {
    let splitter = TextSplitter::new(50, 10).expect("splitter");
    let text = "这是一个测试文本。".repeat(10);
    let chunks = splitter.split(&text);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 50);
    }
}

#[test]
fn higher_priority_separator_wins() {
    let splitter = TextSplitter::with_separators(
        20,
        0,
        vec!["\n\n".to_string(), "\n".to_string(), " ".to_string()],
    )
    .expect("splitter");
    let text = "Paragraph 1.\n\nParagraph 2.\n\nParagraph 3.";
    let chunks = splitter.split(text);

    // Paragraphs fit individually but not together, so the splitter breaks
    // on the paragraph separator and never descends to word level.
    assert_eq!(
        chunks,
        vec![
            "Paragraph 1.".to_string(),
            "Paragraph 2.".to_string(),
            "Paragraph 3.".to_string(),
        ]
    );
}

#[test]
fn clean_then_split_produces_clean_chunks() {
    let splitter = TextSplitter::new(40, 5).expect("splitter");
    let raw = "Some\x00 document   text\n\nwith  messy\twhitespace. ".repeat(5);
    let cleaned = clean_text(&raw);
    assert!(!cleaned.contains('\x00'));
    assert!(!cleaned.contains("  "));

    let chunks = splitter.split(&cleaned);
    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(!chunk.contains('\x00'));
        assert!(chunk.chars().count() <= 40);
    }
}
