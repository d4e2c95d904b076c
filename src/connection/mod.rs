pub mod listener;
pub mod replay;
