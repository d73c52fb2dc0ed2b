mod handler;
mod model;

pub use handler::{get_me, update_me};
