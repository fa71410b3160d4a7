pub mod percent;
pub mod time;
