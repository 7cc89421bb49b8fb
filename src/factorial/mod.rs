pub mod core;
pub mod span;


pub use self::core::*;
pub use self::span::*;
