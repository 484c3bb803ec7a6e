pub mod open_date_handler;

pub use open_date_handler::{
    __path_create_open_date, __path_get_open_date, __path_update_open_date_visibility,
    create_open_date, get_open_date, update_open_date_visibility,
};
