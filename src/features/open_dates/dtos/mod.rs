mod open_date_dto;

pub use open_date_dto::{CreateOpenDateDto, OpenDateResponseDto, UpdateVisibilityDto};
