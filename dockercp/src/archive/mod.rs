//! Archive handling: re-framing the engine stream and materializing it.
//!
//! `chunk` turns whatever framing the transport delivers into fixed-size
//! chunks of the configured buffer length; `materialize` persists those
//! chunks to a temporary tar file and unpacks it.

mod chunk;
mod materialize;

pub use chunk::chunked;
pub use materialize::{ExtractReport, Materializer, PersistedArchive};
