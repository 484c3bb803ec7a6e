pub mod user_handler;

pub use user_handler::{__path_create_user, __path_get_user, create_user, get_user};
