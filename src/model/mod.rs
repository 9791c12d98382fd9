pub mod board;
pub mod config;
pub mod connection;
pub mod geo;
pub mod geometry;
pub mod item;

pub use board::*;
pub use config::*;
pub use connection::*;
pub use geo::*;
pub use geometry::*;
pub use item::*;
