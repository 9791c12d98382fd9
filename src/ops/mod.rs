pub mod board_ops;
pub mod check;
pub mod connection_line;
pub mod drag;
pub mod globe;
pub mod search;
