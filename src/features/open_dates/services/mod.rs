mod open_date_service;

pub use open_date_service::OpenDateService;
