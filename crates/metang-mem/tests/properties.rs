//! Property-based tests for arena and string-view invariants
//!
//! Uses proptest to check that allocation, splitting and casing keep
//! their guarantees across arbitrary request sequences and inputs.

use metang_mem::{AllocFlags, Arena, Case, Span, Str};
use proptest::prelude::*;

/// (size, log2 alignment, count) triples small enough to stay in memory.
fn requests() -> impl Strategy<Value = Vec<(usize, u32, usize)>> {
    prop::collection::vec((0usize..32, 0u32..5, 0usize..8), 1..64)
}

proptest! {
    /// Every span starts at a multiple of its alignment
    #[test]
    fn allocations_are_aligned(reqs in requests()) {
        let mut arena = Arena::new(0);
        for (size, shift, count) in reqs {
            let align = 1usize << shift;
            let span = arena.alloc(size, align, count, AllocFlags::EXTEND).unwrap();
            prop_assert_eq!(span.offset % align, 0);
            prop_assert_eq!(span.len, size * count);
        }
    }

    /// Spans never overlap and the offset only moves forward
    #[test]
    fn allocations_are_disjoint(reqs in requests()) {
        let mut arena = Arena::new(16);
        let mut last_end = 0;
        for (size, shift, count) in reqs {
            let span = arena.alloc(size, 1 << shift, count, AllocFlags::EXTEND).unwrap();
            prop_assert!(span.offset >= last_end);
            prop_assert_eq!(arena.offset(), span.end());
            prop_assert!(arena.offset() <= arena.capacity());
            last_end = span.end();
        }
    }

    /// Growing the buffer keeps every earlier byte in place
    #[test]
    fn growth_preserves_content(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..32)) {
        let mut arena = Arena::new(1);
        let spans: Vec<Span> = chunks
            .iter()
            .map(|chunk| arena.claim(chunk, AllocFlags::EXTEND).unwrap().unwrap())
            .collect();

        for (span, chunk) in spans.iter().zip(&chunks) {
            prop_assert_eq!(arena.view(*span).as_bytes(), chunk.as_slice());
        }
    }

    /// A soft failure leaves the arena exactly as it was
    #[test]
    fn soft_failure_is_pure(used in 0usize..64, extra in 1usize..64) {
        let mut arena = Arena::new(64);
        arena.alloc(1, 1, used, AllocFlags::empty()).unwrap();
        let before = arena.stats();

        let request = 64 - used + extra;
        let result = arena.allocate(1, 1, request, AllocFlags::SOFT_FAIL | AllocFlags::ZERO).unwrap();

        prop_assert_eq!(result, None);
        prop_assert_eq!(arena.stats(), before);
    }

    /// Splitting and re-joining with the delimiter gives the input back
    #[test]
    fn split_rejoins(text in "[a-z=]{0,32}") {
        let s = Str::from(text.as_str());
        for pair in [s.split_at_first(b'='), s.split_at_last(b'=')] {
            let mut joined = pair.head.as_bytes().to_vec();
            if pair.head.len() < s.len() {
                joined.push(b'=');
                joined.extend_from_slice(pair.tail.as_bytes());
            }
            prop_assert_eq!(joined.as_slice(), s.as_bytes());
        }
    }

    /// The head of a first split never holds the delimiter
    #[test]
    fn split_at_first_head_is_clean(text in "[a-z=]{0,32}") {
        let pair = Str::from(text.as_str()).split_at_first(b'=');
        prop_assert!(!pair.head.as_bytes().contains(&b'='));
    }

    /// Casing an already-cased identifier changes nothing
    #[test]
    fn identifier_case_is_idempotent(text in "[ -~]{0,48}", upper in any::<bool>()) {
        let case = if upper { Case::Upper } else { Case::Lower };
        let mut once = vec![0u8; text.len() + 1];
        let first = Str::from(text.as_str()).to_identifier_case(&mut once, None, case);
        let first = first.as_bytes().to_vec();

        let mut twice = vec![0u8; first.len() + 1];
        let second = Str::new(&first).to_identifier_case(&mut twice, None, case);

        prop_assert_eq!(second.as_bytes(), first.as_slice());
        prop_assert!(second.as_bytes().iter().all(|&b| b == b'_' || b.is_ascii_alphanumeric()));
    }

    /// A cloned string does not change when its source does
    #[test]
    fn clone_is_independent(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut source = bytes.clone();
        let mut arena = Arena::new(8);

        let span = Str::new(&source).clone_into(&mut arena, AllocFlags::EXTEND).unwrap().unwrap();
        source.iter_mut().for_each(|b| *b = b.wrapping_add(1));

        prop_assert_eq!(arena.view(span).as_bytes(), bytes.as_slice());
        prop_assert_eq!(arena.live()[span.end()], 0);
    }

    /// Writing to later allocations never reaches an earlier clone
    #[test]
    fn clone_survives_later_writes(
        bytes in prop::collection::vec(any::<u8>(), 1..64),
        later in prop::collection::vec((1usize..48, any::<u8>()), 1..8),
    ) {
        let mut arena = Arena::new(4);
        let source = arena.claim(&bytes, AllocFlags::EXTEND).unwrap().unwrap();
        let copy = arena.clone_span(source, AllocFlags::EXTEND).unwrap().unwrap();
        let copied = Str::new(&bytes).clone_into(&mut arena, AllocFlags::EXTEND).unwrap().unwrap();

        for (len, fill) in later {
            let span = arena.alloc(1, 1, len, AllocFlags::EXTEND).unwrap();
            arena.view_mut(span).fill(fill);
        }
        arena.view_mut(source).iter_mut().for_each(|b| *b = b.wrapping_add(1));

        prop_assert_ne!(copy, source);
        prop_assert_eq!(arena.view(copy).as_bytes(), bytes.as_slice());
        prop_assert_eq!(arena.view(copied).as_bytes(), bytes.as_slice());
        prop_assert_eq!(arena.live()[copy.end()], 0);
        prop_assert_eq!(arena.live()[copied.end()], 0);
    }

    /// Decimal text of any i64 parses back to the same value
    #[test]
    fn parse_integer_matches_display(value in any::<i64>()) {
        let text = value.to_string();
        prop_assert_eq!(Str::from(text.as_str()).parse_integer(), Ok(value));
    }
}
