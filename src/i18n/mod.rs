//! Internationalization (i18n) support
//!
//! UI strings ship built in for pt-BR and en. A site can override any of
//! them with `languages/<lang>.yml`.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PT_BR: &[(&str, &str)] = &[
    ("load_more", "Carregar mais posts"),
    ("loading", "Carregando..."),
    ("load_error", "Não foi possível carregar mais posts. Tente novamente."),
    ("reading_time", "%d min"),
    ("not_found", "Post não encontrado"),
    ("back_home", "Voltar para a página inicial"),
    ("banner_alt", "imagem"),
];

const EN: &[(&str, &str)] = &[
    ("load_more", "Load more posts"),
    ("loading", "Loading..."),
    ("load_error", "Could not load more posts. Please try again."),
    ("reading_time", "%d min"),
    ("not_found", "Post not found"),
    ("back_home", "Back to the home page"),
    ("banner_alt", "banner"),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in strings
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        translations.insert("pt-BR".to_string(), to_map(PT_BR));
        translations.insert("en".to_string(), to_map(EN));
        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load override files from a directory
    ///
    /// Files are named after the language (`pt-BR.yml`); nested keys are
    /// flattened with dots. Unparseable files are skipped with a warning.
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = match path.file_stem().and_then(|s| s.to_str()) {
                Some(lang) => lang.to_string(),
                None => continue,
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    let mut flat = HashMap::new();
                    flatten_translations(&data, "", &mut flat);
                    self.translations.entry(lang).or_default().extend(flat);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key, falling back to English, then to the key
    pub fn get(&self, key: &str) -> String {
        self.translations
            .get(&self.language)
            .and_then(|t| t.get(key))
            .or_else(|| self.translations.get("en").and_then(|t| t.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translation with `%d` replaced by a number
    pub fn get_count(&self, key: &str, count: usize) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// Every string for the current language, English filling the gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = self
            .translations
            .get(&self.language)
            .cloned()
            .unwrap_or_default();

        if let Some(en) = self.translations.get("en") {
            for (k, v) in en {
                result.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Flatten translations into a HashMap with dot-notation keys
fn flatten_translations(
    data: &HashMap<String, serde_yaml::Value>,
    prefix: &str,
    result: &mut HashMap<String, String>,
) {
    for (key, value) in data {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::String(s) => {
                result.insert(full_key, s.clone());
            }
            serde_yaml::Value::Number(n) => {
                result.insert(full_key, n.to_string());
            }
            serde_yaml::Value::Bool(b) => {
                result.insert(full_key, b.to_string());
            }
            serde_yaml::Value::Mapping(map) => {
                let nested: HashMap<String, serde_yaml::Value> = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            _ => {}
        }
    }
}
