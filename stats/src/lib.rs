pub mod bridge;
pub mod dist;

pub use bridge::Bridge;
pub use dist::Distribution;
