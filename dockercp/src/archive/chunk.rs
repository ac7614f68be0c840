//! Fixed-size re-framing of a byte stream.

use std::num::NonZeroUsize;

use bytes::{Bytes, BytesMut};
use dockercp_shared::errors::DockercpResult;
use futures::{Stream, StreamExt};

use crate::backend::ArchiveStream;

/// Re-frame `stream` into chunks of exactly `buffer_len` bytes.
///
/// Only the final chunk may be shorter. Bytes are never dropped, duplicated
/// or reordered. The first error from `stream` is forwarded as is and ends
/// the output; the materializer decides what an interruption means.
pub fn chunked<S>(stream: S, buffer_len: NonZeroUsize) -> ArchiveStream
where
    S: Stream<Item = DockercpResult<Bytes>> + Send + 'static,
{
    let buffer_len = buffer_len.get();

    Box::pin(async_stream::stream! {
        let mut frames = Box::pin(stream);
        let mut pending = BytesMut::new();

        while let Some(frame) = frames.next().await {
            match frame {
                Ok(bytes) => {
                    pending.extend_from_slice(&bytes);
                    while pending.len() >= buffer_len {
                        yield Ok(pending.split_to(buffer_len).freeze());
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if !pending.is_empty() {
            yield Ok(pending.freeze());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockercp_shared::errors::DockercpError;
    use futures::TryStreamExt;
    use proptest::prelude::*;

    fn frames(parts: Vec<Vec<u8>>) -> impl Stream<Item = DockercpResult<Bytes>> + Send + 'static {
        futures::stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p))))
    }

    fn collect(parts: Vec<Vec<u8>>, buffer_len: usize) -> Vec<Bytes> {
        let stream = chunked(frames(parts), NonZeroUsize::new(buffer_len).unwrap());
        futures::executor::block_on(stream.try_collect()).unwrap()
    }

    #[test]
    fn test_exact_chunks() {
        let chunks = collect(vec![b"abcdefgh".to_vec(), b"ij".to_vec()], 4);
        assert_eq!(chunks, vec![&b"abcd"[..], &b"efgh"[..], &b"ij"[..]]);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        assert!(collect(vec![], 16).is_empty());
        assert!(collect(vec![vec![]], 16).is_empty());
    }

    #[test]
    fn test_error_is_forwarded_and_ends_stream() {
        let parts: Vec<DockercpResult<Bytes>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(DockercpError::backend("connection reset")),
            Ok(Bytes::from_static(b"def")),
        ];
        let stream = chunked(futures::stream::iter(parts), NonZeroUsize::new(2).unwrap());
        let items: Vec<DockercpResult<Bytes>> = futures::executor::block_on(stream.collect());

        // Full chunks before the error are delivered; the short remainder is not.
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &b"ab"[..]);
        assert!(
            matches!(&items[1], Err(DockercpError::Backend { detail, .. }) if detail == "connection reset")
        );
    }

    proptest! {
        #[test]
        fn prop_chunking_preserves_bytes(
            parts in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..300), 0..12),
            buffer_len in 1usize..600,
        ) {
            let expected: Vec<u8> = parts.concat();
            let chunks = collect(parts, buffer_len);

            let joined: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
            prop_assert_eq!(joined, expected);

            if let Some((last, rest)) = chunks.split_last() {
                prop_assert!(rest.iter().all(|c| c.len() == buffer_len));
                prop_assert!(!last.is_empty() && last.len() <= buffer_len);
            }
        }
    }
}
