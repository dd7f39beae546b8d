pub mod clock;
pub mod duration;
pub mod labels;
pub mod retry;
