pub mod actions;
pub mod config;
pub mod conversation;
pub mod error;
pub mod persistence;
pub mod preferences;
pub mod reducer;
pub mod state;
pub mod upload;

pub use actions::*;
pub use conversation::*;
pub use error::*;
pub use preferences::*;
pub use reducer::*;
pub use state::*;
pub use upload::*;

pub use config::*;
pub use persistence::*;
