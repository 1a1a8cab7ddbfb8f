//! Message codec: structured form, payload compression and transport string.
//!
//! Encoding: [`state::to_json`] → [`compression::compress`] → [`transport::pack`].
//! Decoding runs the same stages backwards (see [`crate::decoder`]).

pub mod compression;
pub mod state;
pub mod transport;

pub use compression::{compress, decompress, try_decompress, CompressionError};
pub use state::{deserialize, serialize, StateError, StructuredForm};
pub use transport::{extract_payload, pack, MARKER};
