mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, CAP_EDIT, CAP_IMAGE, CAP_TEXT, CAP_VISION};
pub use selectors::{ModelSelection, ModelSelector};
