mod card;
pub use card::*;

pub mod input;
pub mod screens;

mod window_resizing;
