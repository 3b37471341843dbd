//! Transfer module
//!
//! Passive data channels and the chunked copies run over them.

pub mod data_channel;
pub mod file_ops;

pub use data_channel::{DataConnection, PassiveDataChannel, decode_pasv, encode_pasv};
pub use file_ops::{copy_in_chunks, send_in_chunks};
