pub mod replay;
pub mod transport;
