pub mod cp;
pub mod ps;
