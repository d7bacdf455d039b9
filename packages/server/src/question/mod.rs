//! Question definitions on disk and the variants generated from them.

mod info;
mod render;
mod variant;

pub use info::{ParameterRange, QuestionInfo, load_question_info, question_dir};
pub use render::{generate_params, render_template};
pub use variant::{create_variant, find_variant, load_submission_files, SubmittedFile};
