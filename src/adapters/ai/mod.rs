//! Text generation adapters.
//!
//! - **MockTextGenerator** - Scripted responses for tests and local runs

mod mock_generator;

pub use mock_generator::{MockResponse, MockTextGenerator};
