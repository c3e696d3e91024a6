pub mod contracts;
pub mod responder;
pub mod session;

pub use contracts::*;
pub use responder::*;
pub use session::*;
