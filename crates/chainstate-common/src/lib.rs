pub mod address;
pub mod chains;
pub mod types;
pub mod db;
pub mod error;

pub use chains::{ChainDescriptor, ChainName, RelayChain, Token};
pub use types::*;
pub use error::ChainStateError;
