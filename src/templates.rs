use crate::state::{Document, HistoryEntry, ReplacementEntry};
use minijinja::{context, default_auto_escape_callback, Environment, Value};
use std::path::Path;

pub const INDEX_TEMPLATE: &str = "index.html";

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(default_auto_escape_callback);
        env.set_loader(embedded_template_loader);
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template_name)?;
        tmpl.render(context)
    }
}

fn embedded_template_loader(name: &str) -> Result<Option<String>, minijinja::Error> {
    let template_content = match name {
        INDEX_TEMPLATE => Some(include_str!("templates/index.html")),
        _ => None,
    };

    Ok(template_content.map(|s| s.to_string()))
}

/// Everything the index page shows: full filler and replacement lists, a
/// capped slice of history and the real history length.
#[derive(Debug, Clone)]
pub struct IndexContext<'a> {
    pub state_path: &'a Path,
    pub fillers: &'a [String],
    pub replacements: &'a [ReplacementEntry],
    pub history: &'a [HistoryEntry],
    pub history_count: usize,
}

impl<'a> IndexContext<'a> {
    pub fn new(state_path: &'a Path, document: &'a Document, preview_limit: usize) -> Self {
        Self {
            state_path,
            fillers: &document.filler_words,
            replacements: &document.replacement_entries,
            history: document.history_preview(preview_limit),
            history_count: document.history_entries.len(),
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            state_path => self.state_path.display().to_string(),
            fillers => Value::from_serialize(self.fillers),
            replacements => Value::from_serialize(self.replacements),
            history => Value::from_serialize(self.history),
            history_count => self.history_count,
        }
    }
}
