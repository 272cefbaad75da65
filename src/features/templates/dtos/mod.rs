pub mod stats_dto;
pub mod template_dto;

pub use stats_dto::{DailySubmissionsDto, ProjectStatsDto, ProjectStatsQuery, TopTemplateDto};
pub use template_dto::{
    CreateTemplateDto, ListTemplatesQuery, TemplateResponseDto, UpdateTemplateDto,
};
