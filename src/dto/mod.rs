pub mod result_dto;
pub mod submission_dto;
