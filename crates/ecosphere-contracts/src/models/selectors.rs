use super::registry::ModelRegistry;

/// Ordered model identifiers to try for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates {
    pub capability: String,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_default(),
        }
    }

    pub fn candidates(&self, capability: &str) -> Result<ModelCandidates, String> {
        let models: Vec<String> = self
            .registry
            .by_capability(capability)
            .into_iter()
            .map(|model| model.name)
            .collect();
        if models.is_empty() {
            return Err(format!(
                "No models available for capability '{capability}'."
            ));
        }
        Ok(ModelCandidates {
            capability: capability.to_string(),
            models,
        })
    }
}
