pub mod enums;
pub mod session;
pub mod visit;

pub use enums::*;
pub use session::*;
pub use visit::*;
