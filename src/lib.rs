#![allow(
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod bridge;
pub mod cmd;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod fifo;
pub mod packet;
pub mod port;
pub mod translate;

pub use bridge::Bridge;
pub use cmd::Cmd;
pub use config::Config;
pub use packet::Packet;
pub use translate::Direction;

pub type address = u64;
