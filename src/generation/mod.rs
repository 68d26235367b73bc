//! Everything between parsed panels and finished pages: prompts, image
//! backends, speech bubbles and page assembly.

pub mod assembler;
pub mod backend;
pub mod bubbles;
pub mod generator;
pub mod prompt_builder;
pub mod text;

pub use assembler::{assemble_grid, export_pdf, DEFAULT_THUMB_SIZE};
pub use backend::{BackendType, ImageBackend};
pub use bubbles::draw_speech_bubbles;
pub use generator::{panel_filename, ImageGenerator};
pub use prompt_builder::{
    apply_generation_params, apply_negative_override, build_prompts_for_panels,
    DEFAULT_NEGATIVE_PROMPT,
};
pub use text::{load_font, SharedFont};
