use std::collections::HashSet;

use egui::{Context, FontData, FontDefinitions, FontFamily};

/// Font families installed into one egui context.
///
/// Each family is installed at most once; the definitions accumulate so
/// later installs keep earlier ones. Families that were never installed
/// resolve to the proportional family, since egui panics on unbound
/// named families.
#[derive(Debug, Default)]
pub struct FontRegistry {
    installed: HashSet<String>,
    definitions: Option<FontDefinitions>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `data` as the family `name`. Returns false if the family was
    /// already installed; the new data is ignored in that case.
    pub fn install(&mut self, ctx: &Context, name: &str, data: Vec<u8>) -> bool {
        if self.installed.contains(name) {
            return false;
        }

        let definitions = self.definitions.get_or_insert_with(FontDefinitions::default);
        definitions
            .font_data
            .insert(name.to_owned(), FontData::from_owned(data).into());
        definitions
            .families
            .insert(FontFamily::Name(name.into()), vec![name.to_owned()]);
        ctx.set_fonts(definitions.clone());

        self.installed.insert(name.to_owned());
        log::info!("Installed font family {}", name);
        true
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains(name)
    }

    /// Family to draw `name` with
    pub fn resolve(&self, name: &str) -> FontFamily {
        if self.installed.contains(name) {
            FontFamily::Name(name.into())
        } else {
            FontFamily::Proportional
        }
    }
}
