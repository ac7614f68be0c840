//! Test tooling for dockercp: an in-process mock engine and tar fixtures.

mod engine;
mod fixture;

pub use engine::{MockEngine, MockEngineBuilder};
pub use fixture::TarFixture;
