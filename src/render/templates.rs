use super::traits::Renderer;
use crate::errors::{AppError, AppResult};
use crate::hooks::naming::{pascal_case, snake_case};
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::Value;

handlebars_helper!(upper_snake: |s: str| snake_case(&[s.to_string()]).to_uppercase());
handlebars_helper!(pascal: |s: str| pascal_case(&[s.to_string()]));
handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());
handlebars_helper!(one_line: |s: str| s.split_whitespace().collect::<Vec<_>>().join(" "));
handlebars_helper!(join: |items: array, sep: str| items
    .iter()
    .map(|item| match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
    .collect::<Vec<_>>()
    .join(sep));

/// Handlebars engine holding one target's templates and helpers.
///
/// Generated source is never HTML, so escaping is disabled.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    /// An engine with only the shared helpers registered
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("upper_snake", Box::new(upper_snake));
        handlebars.register_helper("pascal", Box::new(pascal));
        handlebars.register_helper("json", Box::new(json));
        handlebars.register_helper("one_line", Box::new(one_line));
        handlebars.register_helper("join", Box::new(join));
        Self { handlebars }
    }

    /// An engine loaded with a renderer's templates and custom helpers
    pub fn for_renderer<R: Renderer + ?Sized>(renderer: &R) -> AppResult<Self> {
        let mut engine = Self::new();
        for (name, helper) in renderer.custom_filters() {
            engine.handlebars.register_helper(name, helper);
        }
        for (name, source) in renderer.templates() {
            engine.register(name, source)?;
        }
        Ok(engine)
    }

    pub fn register(&mut self, name: &str, source: &str) -> AppResult<()> {
        self.handlebars.register_template_string(name, source)?;
        Ok(())
    }

    pub fn render(&self, name: &str, context: &Value) -> AppResult<String> {
        if !self.handlebars.has_template(name) {
            return Err(AppError::TemplateNotFound {
                name: name.to_string(),
            });
        }
        self.handlebars
            .render(name, context)
            .map_err(|e| AppError::template_with_source(format!("Failed to render '{name}'"), e))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shared_helpers() {
        let mut engine = TemplateEngine::new();
        engine
            .register(
                "t",
                "{{upper_snake name}} {{pascal name}} {{json text}} {{join items \", \"}}",
            )
            .unwrap();
        let out = engine
            .render(
                "t",
                &json!({"name": "dry-run", "text": "say \"hi\"", "items": ["a", 1]}),
            )
            .unwrap();
        assert_eq!(out, r#"DRY_RUN DryRun "say \"hi\"" a, 1"#);
    }

    #[test]
    fn test_one_line_collapses_whitespace() {
        let mut engine = TemplateEngine::new();
        engine.register("t", "// {{one_line text}}").unwrap();
        let out = engine
            .render("t", &json!({"text": "first line\n  second\tline "}))
            .unwrap();
        assert_eq!(out, "// first line second line");
    }

    #[test]
    fn test_output_is_not_html_escaped() {
        let mut engine = TemplateEngine::new();
        engine.register("t", "{{code}}").unwrap();
        let out = engine.render("t", &json!({"code": "a < b && c > d"})).unwrap();
        assert_eq!(out, "a < b && c > d");
    }

    #[test]
    fn test_missing_template_and_bad_syntax() {
        let engine = TemplateEngine::new();
        assert!(matches!(
            engine.render("nope", &json!({})),
            Err(AppError::TemplateNotFound { .. })
        ));

        let mut engine = TemplateEngine::new();
        let err = engine.register("broken", "{{#if x}}unclosed").unwrap_err();
        assert_eq!(err.category(), "template");
    }
}
