mod template;

pub use template::{FormTemplate, TranslationOverlay, ValidationRules};
