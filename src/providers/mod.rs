//! Packet source implementations

pub mod replay;
pub mod tcp;

pub use replay::ReplayProvider;
pub use tcp::TcpProvider;
