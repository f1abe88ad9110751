mod common;

#[cfg(test)]
mod mark_reset_tests {
    use std::cell::Cell;
    use std::io::{self, Cursor, Read};
    use std::rc::Rc;

    use proptest::prelude::*;
    use slice_core::prelude::*;

    use crate::common::{pattern, split_even, tracked_factory, OpenLog};

    fn abc_stream(log: &OpenLog) -> ChainedSliceStream<impl SliceFactory> {
        let parts = vec![b"ABCD".to_vec(), Vec::new(), b"EFGHI".to_vec()];
        ChainedSliceStream::new(3, tracked_factory(parts, log.clone()))
    }

    fn rest<F: SliceFactory>(stream: &mut ChainedSliceStream<F>) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    #[test_log::test]
    fn reset_reopens_marked_slice_and_skips_offset() {
        let log = OpenLog::default();
        let mut stream = abc_stream(&log);

        let mut buf = [0u8; 6];
        assert_eq!(stream.read_into(&mut buf).unwrap(), 6);
        stream.mark(0);
        assert_eq!(
            stream.marked(),
            Some(Mark { index: 2, offset: 2, position: 6 })
        );

        let mut two = [0u8; 2];
        stream.read_into(&mut two).unwrap();
        assert_eq!(&two, b"GH");

        stream.reset().unwrap();
        assert_eq!(stream.position(), 6);
        // The stale instance of slice 2 was closed before the fresh one opened.
        assert_eq!(log.opened_indices(), vec![0, 1, 2, 2]);
        assert_eq!(log.close_counts(), vec![1, 1, 1, 0]);

        assert_eq!(rest(&mut stream), b"GHI");
    }

    #[test]
    fn mark_reset_across_many_boundaries() {
        let data = pattern(2_000);
        let parts = split_even(&data, 9);
        let log = OpenLog::default();
        let mut stream = ChainedSliceStream::new(9, tracked_factory(parts, log.clone()));

        let mut head = vec![0u8; 150];
        stream.read_into(&mut head).unwrap();
        stream.mark(usize::MAX);

        // Walk far past several slice boundaries.
        let mut ahead = vec![0u8; 1_500];
        assert_eq!(stream.read_into(&mut ahead).unwrap(), 1_500);

        stream.reset().unwrap();
        assert_eq!(rest(&mut stream), &data[150..]);

        stream.close();
        assert!(log.close_counts().iter().all(|&c| c == 1));
    }

    #[test]
    fn reset_is_reusable() {
        let mut stream = MemorySlices::new(vec![b"abc".to_vec(), b"def".to_vec()]).into_stream();
        stream.skip(2).unwrap();
        stream.mark(16);

        for _ in 0..3 {
            assert_eq!(&stream.read_bytes(3).unwrap()[..], b"cde");
            stream.reset().unwrap();
        }
        assert_eq!(rest(&mut stream), b"cdef");
    }

    #[test]
    fn mark_before_first_read_restarts_from_zero() {
        let log = OpenLog::default();
        let mut stream = abc_stream(&log);
        stream.mark(0);
        assert_eq!(stream.marked(), Some(Mark { index: 0, offset: 0, position: 0 }));

        assert_eq!(rest(&mut stream), b"ABCDEFGHI");
        stream.reset().unwrap();
        assert_eq!(rest(&mut stream), b"ABCDEFGHI");
    }

    #[test]
    fn mark_at_eof_resets_to_eof() {
        let log = OpenLog::default();
        let mut stream = abc_stream(&log);
        assert_eq!(rest(&mut stream), b"ABCDEFGHI");

        stream.mark(0);
        let opens = log.opens();
        stream.reset().unwrap();
        assert_eq!(log.opens(), opens, "nothing left to re-open at EOF");
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn reset_without_mark_fails_and_keeps_position() {
        let mut stream = MemorySlices::new(vec![b"abc".to_vec(), b"def".to_vec()]).into_stream();
        assert_eq!(stream.read_byte().unwrap(), Some(b'a'));

        let err = stream.reset().unwrap_err();
        assert!(matches!(err, StreamError::InvalidReset(ResetRejection::NoMark)));
        assert_eq!(stream.position(), 1);
        assert_eq!(rest(&mut stream), b"bcdef");
    }

    #[test]
    fn closed_stream_reads_eof_and_rejects_reset() {
        let parts: Vec<Vec<u8>> = (0..5).map(|_| vec![0u8]).collect();
        let mut stream = MemorySlices::new(parts).into_stream();

        stream.skip(3).unwrap();
        stream.mark(100);
        stream.close();

        assert_eq!(stream.read_byte().unwrap(), None);
        assert!(matches!(
            stream.reset(),
            Err(StreamError::InvalidReset(ResetRejection::Closed))
        ));
        assert_eq!(stream.read_byte().unwrap(), None);
        stream.mark(100);
        assert_eq!(stream.read_byte().unwrap(), None);
        assert!(stream.reset().unwrap_err().is_invalid_reset());
    }

    #[test]
    fn unsupported_mark_is_noop_and_reset_fails() {
        let parts: Vec<Vec<u8>> = (0..3).map(|_| vec![0u8]).collect();
        let mut stream = MemorySlices::new(parts).into_stream_with(SliceStreamConfig::without_mark());
        assert!(!stream.mark_supported());

        stream.mark(10);
        assert_eq!(stream.marked(), None);
        assert!(matches!(
            stream.reset(),
            Err(StreamError::InvalidReset(ResetRejection::Unsupported))
        ));
        stream.close();
    }

    #[test]
    fn zero_slices_mark_and_reset_are_trivial() {
        let factory = |_: usize| -> io::Result<Cursor<Vec<u8>>> {
            panic!("factory must not be called for an empty stream")
        };
        let mut stream = ChainedSliceStream::new(0, factory);

        assert_eq!(stream.read_byte().unwrap(), None);
        stream.mark(7);
        stream.reset().unwrap();
        assert_eq!(stream.read_byte().unwrap(), None);
        stream.close();
    }

    #[test]
    fn reset_tolerates_reopening_already_passed_slices() {
        let log = OpenLog::default();
        let mut stream = abc_stream(&log);
        stream.mark(0);
        assert_eq!(rest(&mut stream), b"ABCDEFGHI");

        stream.reset().unwrap();
        assert_eq!(rest(&mut stream), b"ABCDEFGHI");
        assert_eq!(log.opened_indices(), vec![0, 1, 2, 0, 1, 2]);

        let snapshot = stream.telemetry();
        assert_eq!(snapshot.slices_reopened, 3);
        assert_eq!(snapshot.resets, 1);
    }

    #[test]
    fn truncated_reopen_is_reported() {
        // Second open of slice 0 returns fewer bytes than the first.
        let opens = Rc::new(Cell::new(0usize));
        let counter = opens.clone();
        let factory = move |_: usize| -> io::Result<Cursor<Vec<u8>>> {
            counter.set(counter.get() + 1);
            let len = if counter.get() == 1 { 8 } else { 2 };
            Ok(Cursor::new(vec![1u8; len]))
        };
        let mut stream = ChainedSliceStream::new(1, factory);

        stream.skip(5).unwrap();
        stream.mark(0);
        match stream.reset() {
            Err(StreamError::MarkedSliceTruncated { index, expected, actual }) => {
                assert_eq!((index, expected, actual), (0, 5, 2));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(opens.get(), 2);
        // Both instances were released even though the restore failed.
        let snapshot = stream.telemetry();
        assert_eq!(snapshot.slices_opened, snapshot.slices_closed);
    }

    #[test]
    fn failed_reset_open_is_retried_by_next_read() {
        let fail_next = Rc::new(Cell::new(false));
        let flag = fail_next.clone();
        let factory = move |i: usize| -> io::Result<Cursor<Vec<u8>>> {
            if flag.replace(false) {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "blob store timeout"));
            }
            Ok(Cursor::new(vec![b'a' + i as u8; 4]))
        };
        let mut stream = ChainedSliceStream::new(2, factory);

        assert_eq!(&stream.read_bytes(6).unwrap()[..], b"aaaabb");
        stream.mark(0);
        stream.read_byte().unwrap();

        fail_next.set(true);
        let err = stream.reset().unwrap_err();
        assert!(matches!(err, StreamError::Io(ref e) if e.kind() == io::ErrorKind::TimedOut));

        // The pending restore lands the cursor exactly on the mark.
        assert_eq!(rest(&mut stream), b"bb");
    }

    proptest! {
        #[test]
        fn prop_reset_replays_suffix_from_mark(
            len in 1usize..1_500,
            slices in 1usize..20,
            mark_frac in 0.0f64..=1.0,
            more_frac in 0.0f64..=1.0,
        ) {
            let data = pattern(len);
            let parts = split_even(&data, slices.min(len));
            let count = parts.len();
            let log = OpenLog::default();
            let mut stream = ChainedSliceStream::new(count, tracked_factory(parts, log.clone()));

            let mark = (len as f64 * mark_frac) as usize;
            let head = stream.read_bytes(mark).unwrap();
            prop_assert_eq!(&head[..], &data[..mark]);

            prop_assert!(stream.reset().is_err());
            stream.mark(0);

            let more = ((len - mark) as f64 * more_frac) as usize;
            let ahead = stream.read_bytes(more).unwrap();
            prop_assert_eq!(&ahead[..], &data[mark..mark + more]);

            stream.reset().unwrap();
            let tail = rest(&mut stream);
            prop_assert_eq!(&tail[..], &data[mark..]);
            prop_assert_eq!(stream.read_byte().unwrap(), None);

            stream.close();
            prop_assert!(log.close_counts().iter().all(|&c| c == 1));
        }
    }
}
