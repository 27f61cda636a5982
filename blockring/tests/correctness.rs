//! Single-threaded correctness: round trips, wraparound, and property tests
//! against a plain `Vec` model of the ring.

use blockring::{
    BlockRing, ExclusiveLock, RingBuffer, RingConfig, SeqLock, SharedLock, SyncStrategy,
    Unsynchronized,
};
use proptest::prelude::*;

fn make_ring<S: SyncStrategy<u64>>(num_blocks: usize, block_size: usize) -> RingBuffer<u64, S> {
    RingBuffer::new(RingConfig::new(num_blocks, block_size)).unwrap()
}

// =============================================================================
// Round trip
// =============================================================================

fn check_roundtrip<S: SyncStrategy<u64>>() {
    let block_size = 640;
    let mut ring = make_ring::<S>(10, block_size);
    let mut dst = vec![0u64; block_size];

    for v in 0..100u64 {
        let src = vec![v; block_size];
        let offset = ring.strategy().ring().block_offset((v as usize) % 10);
        ring.write(&src).unwrap();
        ring.read(&mut dst, offset).unwrap();
        assert_eq!(dst, src, "value {}", v);
    }
}

fn check_roundtrip_distinct_elements<S: SyncStrategy<u64>>() {
    let mut ring = make_ring::<S>(4, 16);
    let src: Vec<u64> = (100..116).collect();
    ring.write(&src).unwrap();
    assert_eq!(ring.read_vec(0).unwrap(), src);
}

#[test]
fn test_roundtrip_unsynchronized() {
    check_roundtrip::<Unsynchronized<u64>>();
    check_roundtrip_distinct_elements::<Unsynchronized<u64>>();
}

#[test]
fn test_roundtrip_exclusive() {
    check_roundtrip::<ExclusiveLock<u64>>();
    check_roundtrip_distinct_elements::<ExclusiveLock<u64>>();
}

#[test]
fn test_roundtrip_shared() {
    check_roundtrip::<SharedLock<u64>>();
    check_roundtrip_distinct_elements::<SharedLock<u64>>();
}

#[test]
fn test_roundtrip_seqlock() {
    check_roundtrip::<SeqLock<u64>>();
    check_roundtrip_distinct_elements::<SeqLock<u64>>();
}

#[test]
fn test_roundtrip_float_elements() {
    let mut ring = RingBuffer::<f32, SeqLock<f32>>::new(RingConfig::new(3, 4)).unwrap();
    ring.write(&[0.5, -1.0, f32::MAX, f32::MIN_POSITIVE]).unwrap();
    assert_eq!(
        ring.read_vec(0).unwrap(),
        vec![0.5, -1.0, f32::MAX, f32::MIN_POSITIVE]
    );
}

// =============================================================================
// Wraparound
// =============================================================================

/// Write number `num_blocks + 1` lands in block 0 again.
fn check_wraparound<S: SyncStrategy<u64>>() {
    let num_blocks = 10;
    let block_size = 16;
    let mut ring = make_ring::<S>(num_blocks, block_size);

    for v in 0..num_blocks as u64 {
        ring.write(&vec![v; block_size]).unwrap();
    }
    for block in 0..num_blocks {
        assert_eq!(
            ring.read_vec(block * block_size).unwrap(),
            vec![block as u64; block_size]
        );
    }

    // Write number num_blocks + 1 wraps to block 0.
    ring.write(&vec![999; block_size]).unwrap();
    assert_eq!(ring.read_vec(0).unwrap(), vec![999; block_size]);
    assert_eq!(ring.read_vec(block_size).unwrap(), vec![1; block_size]);
}

#[test]
fn test_wraparound_unsynchronized() {
    check_wraparound::<Unsynchronized<u64>>();
}

#[test]
fn test_wraparound_exclusive() {
    check_wraparound::<ExclusiveLock<u64>>();
}

#[test]
fn test_wraparound_shared() {
    check_wraparound::<SharedLock<u64>>();
}

#[test]
fn test_wraparound_seqlock() {
    check_wraparound::<SeqLock<u64>>();
}

#[test]
fn test_cursor_positions_match_addressing() {
    let mut ring = RingBuffer::<u64, SeqLock<u64>>::new(RingConfig::new(3, 5)).unwrap();
    let mut expected = 0;
    for _ in 0..7 {
        assert_eq!(ring.strategy().write_position(), expected);
        ring.write(&[0; 5]).unwrap();
        expected = BlockRing::new(3, 5).advance(expected);
    }
    assert_eq!(ring.strategy().write_position(), 5);
}

#[test]
fn test_fill_then_read_everywhere() {
    let mut ring = make_ring::<SharedLock<u64>>(6, 8);
    ring.fill(12345);
    for block in 0..6 {
        assert_eq!(ring.read_vec(block * 8).unwrap(), vec![12345; 8]);
    }
}

// =============================================================================
// Properties
// =============================================================================

/// Apply writes to a Vec model of the ring.
fn model_after_writes(num_blocks: usize, block_size: usize, writes: &[u64]) -> Vec<u64> {
    let mut model = vec![0u64; num_blocks * block_size];
    for (i, &v) in writes.iter().enumerate() {
        let block = i % num_blocks;
        model[block * block_size..(block + 1) * block_size].fill(v);
    }
    model
}

fn check_against_model<S: SyncStrategy<u64>>(
    num_blocks: usize,
    block_size: usize,
    writes: &[u64],
) -> Result<(), TestCaseError> {
    let mut ring = make_ring::<S>(num_blocks, block_size);
    ring.fill(0);
    for &v in writes {
        ring.write(&vec![v; block_size]).unwrap();
    }

    let model = model_after_writes(num_blocks, block_size, writes);
    for block in 0..num_blocks {
        let offset = block * block_size;
        prop_assert_eq!(
            ring.read_vec(offset).unwrap(),
            model[offset..offset + block_size].to_vec()
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any write sequence leaves each block holding its most recent write.
    #[test]
    fn ring_matches_model(
        num_blocks in 1usize..12,
        block_size in 1usize..24,
        writes in prop::collection::vec(any::<u64>(), 0..40),
    ) {
        check_against_model::<SeqLock<u64>>(num_blocks, block_size, &writes)?;
        check_against_model::<ExclusiveLock<u64>>(num_blocks, block_size, &writes)?;
        check_against_model::<SharedLock<u64>>(num_blocks, block_size, &writes)?;
        check_against_model::<Unsynchronized<u64>>(num_blocks, block_size, &writes)?;
    }

    /// The cursor visits blocks 0, 1, ..., n-1, 0, ... and stays in range.
    #[test]
    fn advance_cycles_through_blocks(
        num_blocks in 1usize..64,
        block_size in 1usize..64,
        steps in 0usize..256,
    ) {
        let ring = BlockRing::new(num_blocks, block_size);
        let mut cursor = 0;
        for step in 0..steps {
            prop_assert_eq!(ring.write_index(cursor), step % num_blocks);
            prop_assert!(cursor < ring.capacity());
            prop_assert_eq!(cursor % block_size, 0);
            cursor = ring.advance(cursor);
        }
    }

    /// Exactly the block-aligned offsets below capacity are readable.
    #[test]
    fn block_index_accepts_only_aligned_offsets(
        num_blocks in 1usize..32,
        block_size in 1usize..32,
        offset in 0usize..2048,
    ) {
        let ring = BlockRing::new(num_blocks, block_size);
        let valid = offset < ring.capacity() && offset % block_size == 0;
        match ring.block_index(offset) {
            Ok(index) => {
                prop_assert!(valid);
                prop_assert_eq!(index * block_size, offset);
            }
            Err(err) => {
                prop_assert!(!valid);
                prop_assert!(err.is_out_of_range());
            }
        }
    }
}
