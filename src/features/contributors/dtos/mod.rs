mod contributor_dto;

pub(crate) use contributor_dto::blank_to_none;
pub use contributor_dto::{
    ContributorEditFormDto, ContributorQueryParams, ContributorResponseDto, CreateContributorDto,
};
