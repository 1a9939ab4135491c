pub mod battery_status;
pub mod credential_cipher;
pub mod region;
pub mod session;
pub mod status_decoder;
pub mod update_cycle;
pub mod wire;
