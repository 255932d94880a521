use indexmap::IndexMap;

pub mod capability {
    pub const TEXT: &str = "text";
    pub const VISION: &str = "vision";
    pub const SEARCH: &str = "search";
    pub const CHAT: &str = "chat";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub capabilities: Vec<String>,
}

impl ModelSpec {
    pub fn new(name: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            capabilities: capabilities
                .iter()
                .map(|item| (*item).to_string())
                .collect(),
        }
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

/// Ordered model table; insertion order is fallback priority.
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

    pub fn from_specs(specs: impl IntoIterator<Item = ModelSpec>) -> Self {
        Self {
            models: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    use capability::{CHAT, SEARCH, TEXT, VISION};

    let mut map = IndexMap::new();
    let mut insert = |name: &str, capabilities: &[&str]| {
        map.insert(name.to_string(), ModelSpec::new(name, capabilities));
    };

    insert("gemini-2.5-flash", &[TEXT, VISION, SEARCH, CHAT]);
    insert("gemini-2.0-flash", &[TEXT, VISION, SEARCH, CHAT]);
    insert("gemini-2.5-flash-lite", &[TEXT, VISION, SEARCH, CHAT]);
    // googleSearch tool is not offered on 1.5.
    insert("gemini-1.5-flash", &[TEXT, VISION, CHAT]);

    map
}
