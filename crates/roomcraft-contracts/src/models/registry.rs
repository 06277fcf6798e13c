use indexmap::IndexMap;

pub const CAP_TEXT: &str = "text";
pub const CAP_VISION: &str = "vision";
pub const CAP_IMAGE: &str = "image";
/// Image output conditioned on a reference photo.
pub const CAP_EDIT: &str = "edit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub context_window: Option<u64>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }

    /// Imagen models are served from `:predict`, everything else from
    /// `:generateContent`.
    pub fn uses_predict_endpoint(&self) -> bool {
        self.provider == "imagen"
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(normalize_name(name))
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }

    /// Known spec for `name`, or one inferred from the name for models the
    /// registry has not seen yet.
    pub fn resolve(&self, name: &str) -> ModelSpec {
        if let Some(spec) = self.get(name) {
            return spec.clone();
        }
        infer_spec(normalize_name(name))
    }
}

fn normalize_name(name: &str) -> &str {
    name.trim().trim_start_matches("models/")
}

fn infer_spec(name: &str) -> ModelSpec {
    let lower = name.to_ascii_lowercase();
    let (provider, capabilities): (&str, &[&str]) = if lower.starts_with("imagen") {
        ("imagen", &[CAP_IMAGE])
    } else if lower.contains("image") {
        ("gemini", &[CAP_IMAGE, CAP_EDIT, CAP_VISION, CAP_TEXT])
    } else {
        ("gemini", &[CAP_TEXT, CAP_VISION])
    };
    ModelSpec {
        name: name.to_string(),
        provider: provider.to_string(),
        capabilities: capabilities
            .iter()
            .map(|item| (*item).to_string())
            .collect(),
        context_window: None,
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str,
                      provider: &str,
                      capabilities: &[&str],
                      context_window: Option<u64>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
                context_window,
            },
        );
    };

    insert(
        "gemini-2.5-flash-image",
        "gemini",
        &[CAP_IMAGE, CAP_EDIT, CAP_VISION, CAP_TEXT],
        Some(32768),
    );
    insert(
        "gemini-3-pro-image-preview",
        "gemini",
        &[CAP_IMAGE, CAP_EDIT, CAP_VISION, CAP_TEXT],
        Some(65536),
    );
    insert(
        "gemini-2.0-flash-exp",
        "gemini",
        &[CAP_TEXT, CAP_VISION],
        Some(1048576),
    );
    insert(
        "gemini-2.5-flash",
        "gemini",
        &[CAP_TEXT, CAP_VISION],
        Some(1048576),
    );
    insert(
        "gemini-2.5-pro",
        "gemini",
        &[CAP_TEXT, CAP_VISION],
        Some(1048576),
    );
    insert("imagen-4.0-generate-001", "imagen", &[CAP_IMAGE], None);
    insert("imagen-4.0-ultra-generate-001", "imagen", &[CAP_IMAGE], None);
    insert("imagen-3.0-generate-002", "imagen", &[CAP_IMAGE], None);

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_image_model_supports_edit_and_text() {
        let registry = ModelRegistry::default();
        let spec = registry
            .ensure("gemini-2.5-flash-image", CAP_EDIT)
            .expect("known model");
        assert!(spec.supports(CAP_TEXT));
        assert!(!spec.uses_predict_endpoint());
    }

    #[test]
    fn list_keeps_declaration_order() {
        let registry = ModelRegistry::default();
        let names: Vec<&str> = registry.list().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"gemini-2.5-flash-image"));
        assert!(names.iter().all(|name| registry.get(name).is_some()));
    }

    #[test]
    fn models_prefix_is_ignored_on_lookup() {
        let registry = ModelRegistry::default();
        assert!(registry.get("models/gemini-2.5-flash").is_some());
    }

    #[test]
    fn resolve_infers_capabilities_for_unknown_names() {
        let registry = ModelRegistry::default();

        let imagen = registry.resolve("imagen-5.0-preview");
        assert_eq!(imagen.provider, "imagen");
        assert!(imagen.supports(CAP_IMAGE));
        assert!(!imagen.supports(CAP_EDIT));
        assert!(imagen.uses_predict_endpoint());

        let text = registry.resolve("gemini-9-flash");
        assert!(text.supports(CAP_TEXT));
        assert!(!text.supports(CAP_IMAGE));

        let image = registry.resolve("models/gemini-9-flash-image");
        assert_eq!(image.name, "gemini-9-flash-image");
        assert!(image.supports(CAP_IMAGE));
    }

    #[test]
    fn text_models_are_not_image_capable() {
        let registry = ModelRegistry::default();
        assert!(registry.ensure("gemini-2.0-flash-exp", CAP_IMAGE).is_none());
        assert!(registry
            .by_capability(CAP_IMAGE)
            .iter()
            .all(|spec| spec.supports(CAP_IMAGE)));
    }
}
