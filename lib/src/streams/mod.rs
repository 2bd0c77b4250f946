mod events;
mod input;

pub use events::*;
pub use input::*;
