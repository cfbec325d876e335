//! INI reading on top of the `configparser` crate.
//!
//! - `[section]` headers, `[DEFAULT]` supplies fallback values
//! - `key = value` or `key: value`, keys are case-insensitive
//! - indented lines continue the previous value (joined with `\n`)

use std::collections::HashMap;

use configparser::ini::Ini;

use crate::error::ConfigError;

const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Default, Clone)]
pub struct IniDocument {
    defaults: HashMap<String, String>,
    sections: Vec<(String, HashMap<String, String>)>,
}

/// View of one section with `[DEFAULT]` fallback.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    values: &'a HashMap<String, String>,
    defaults: &'a HashMap<String, String>,
}

impl<'a> Section<'a> {
    pub fn get(&self, key: &str) -> Option<&'a str> {
        let key = key.to_lowercase();
        self.values
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }
}

impl IniDocument {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        // Case-sensitive parsing keeps section names intact; keys are
        // lowercased below.
        let mut ini = Ini::new_cs();
        ini.set_multiline(true);
        let parsed = ini.read(text.to_string()).map_err(ConfigError::Parse)?;

        let mut doc = IniDocument::default();
        for (name, entries) in parsed.iter() {
            let values: HashMap<String, String> = entries
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .as_ref()
                        .map(|v| (key.to_lowercase(), v.trim().to_string()))
                })
                .collect();

            if name == DEFAULT_SECTION {
                doc.defaults.extend(values);
            } else if let Some((_, existing)) = doc.sections.iter_mut().find(|(n, _)| n == name) {
                existing.extend(values);
            } else {
                doc.sections.push((name.clone(), values));
            }
        }
        Ok(doc)
    }

    pub fn section(&self, name: &str) -> Option<Section<'_>> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| Section {
                values,
                defaults: &self.defaults,
            })
    }

    /// Section names in file order, without `[DEFAULT]`.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }
}
