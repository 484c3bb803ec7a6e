pub mod contributor_handler;

pub use contributor_handler::{
    __path_add_admin, __path_add_invited_open_date, __path_add_owned_open_date,
    __path_add_super_admin, __path_add_team, __path_create_contributor,
    __path_delete_contributor, __path_get_contributor, __path_get_contributor_edit_form,
    __path_list_contributors, __path_list_public_open_dates, __path_remove_admin,
    __path_remove_invited_open_date, __path_remove_owned_open_date, __path_remove_super_admin,
    __path_remove_team, __path_update_contributor, add_admin, add_invited_open_date,
    add_owned_open_date, add_super_admin, add_team, create_contributor, delete_contributor,
    get_contributor, get_contributor_edit_form, list_contributors, list_public_open_dates,
    remove_admin, remove_invited_open_date, remove_owned_open_date, remove_super_admin,
    remove_team, update_contributor,
};
