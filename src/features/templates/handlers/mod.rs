pub mod template_handler;

pub use template_handler::{
    __path_create_template, __path_delete_template, __path_get_template, __path_list_templates,
    __path_project_stats, __path_update_template, create_template, delete_template, get_template,
    list_templates, project_stats, update_template,
};
