mod open_date;

pub use open_date::OpenDate;
