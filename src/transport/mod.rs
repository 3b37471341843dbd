//! Transport module
//!
//! TLS setup and control-channel line framing.

pub mod control;
pub mod tls;

pub use control::ControlConnection;
pub use tls::{
    client_connector, client_connector_from_pem, load_server_acceptor, server_acceptor_from_pem,
    server_name,
};
