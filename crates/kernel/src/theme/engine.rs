//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::debug;

use crate::menu::Destination;
use crate::shell::NavigationShell;

/// Templates compiled into the binary. A template directory may override any
/// of them by name.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("page.html", include_str!("../../templates/page.html")),
    ("user/login.html", include_str!("../../templates/user/login.html")),
    (
        "views/placeholder.html",
        include_str!("../../templates/views/placeholder.html"),
    ),
    (
        "error/forbidden.html",
        include_str!("../../templates/error/forbidden.html"),
    ),
];

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a theme engine loading overrides from the given directory.
    ///
    /// Built-in templates fill in whatever the directory does not provide.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let mut tera = Tera::parse(pattern_str).context("failed to parse Tera templates")?;
        tera.extend(&Self::builtin_tera()?)
            .context("failed to merge built-in templates")?;

        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), dir = %template_dir.display(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Create a theme engine with only the built-in templates.
    pub fn builtin() -> Result<Self> {
        let mut tera = Self::builtin_tera()?;
        Self::register_filters(&mut tera);

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    fn builtin_tera() -> Result<Tera> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())
            .context("failed to load built-in templates")?;
        Ok(tera)
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Avatar abbreviation: "Jane Doe" -> "JD"
        tera.register_filter(
            "initials",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let name = tera::try_get_value!("initials", "value", String, value);
                Ok(tera::Value::String(initials(&name)))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached.
    ///
    /// Example suggestions: `["page--statistics", "page"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");

        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }

            if self.tera.get_template(suggestion).is_ok() {
                let name = (*suggestion).to_string();
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }

        // Negative results are not cached
        None
    }

    /// Get page template suggestions based on path.
    pub fn page_suggestions(path: &str) -> Vec<String> {
        let mut suggestions = Vec::new();

        // /supported-conditions -> page--supported-conditions
        let normalized = path.trim_matches('/').replace('/', "--");
        if !normalized.is_empty() {
            suggestions.push(format!("page--{normalized}"));
        }

        suggestions.push("page".to_string());

        suggestions
    }

    /// Get body template suggestions for a destination.
    pub fn view_suggestions(destination: &Destination) -> Vec<String> {
        vec![
            format!("views/{}", destination.id),
            "views/placeholder".to_string(),
        ]
    }

    /// Render a destination's body.
    pub fn render_view(
        &self,
        destination: &Destination,
        context: &mut tera::Context,
    ) -> Result<String> {
        let suggestions = Self::view_suggestions(destination);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .unwrap_or_else(|| "views/placeholder.html".to_string());

        context.insert("destination", destination);

        self.tera
            .render(&template, context)
            .with_context(|| format!("failed to render view: {}", destination.id))
    }

    /// Render a full page: the shell with `content` in its main area.
    pub fn render_page(
        &self,
        path: &str,
        shell: &NavigationShell,
        content: &str,
        context: &mut tera::Context,
    ) -> Result<String> {
        let suggestions = Self::page_suggestions(path);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .unwrap_or_else(|| "page.html".to_string());

        context.insert("shell", shell);
        context.insert("content", content);
        context.insert("path", path);

        self.tera
            .render(&template, context)
            .context("failed to render page template")
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

/// Up to two upper-cased initials of a display name.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::access::Access;
    use crate::menu::DestinationRegistry;

    #[test]
    fn test_page_suggestions() {
        let suggestions = ThemeEngine::page_suggestions("/supported-conditions");
        assert_eq!(suggestions, vec!["page--supported-conditions", "page"]);

        let suggestions = ThemeEngine::page_suggestions("/");
        assert_eq!(suggestions, vec!["page"]);
    }

    #[test]
    fn test_view_suggestions() {
        let registry = DestinationRegistry::standard();
        let suggestions = ThemeEngine::view_suggestions(registry.get("donate").unwrap());
        assert_eq!(suggestions, vec!["views/donate", "views/placeholder"]);
    }

    #[test]
    fn test_builtin_templates_load() {
        let engine = ThemeEngine::builtin().unwrap();
        assert_eq!(
            engine.resolve_template(&["page--about", "page"]),
            Some("page.html".to_string())
        );
        assert!(engine.resolve_template(&["nonexistent"]).is_none());
        assert!(engine.resolve_template(&[]).is_none());
    }

    #[test]
    fn test_render_view_placeholder() {
        let engine = ThemeEngine::builtin().unwrap();
        let destination = crate::menu::Destination::new(
            "faq",
            "FAQ",
            "/faq",
            "la la-question",
            Access::Anonymous,
        );

        let html = engine
            .render_view(&destination, &mut tera::Context::new())
            .unwrap();
        assert!(html.contains("FAQ"));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Jane Doe"), "JD");
        assert_eq!(initials("ada"), "A");
        assert_eq!(initials("Mary Ann Smith"), "MA");
        assert_eq!(initials("   "), "");
    }

    #[test]
    fn test_initials_filter() {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);

        tera.add_raw_template("test", "{{ name | initials }}")
            .unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("name", "grace hopper");
        assert_eq!(tera.render("test", &ctx).unwrap(), "GH");
    }
}
