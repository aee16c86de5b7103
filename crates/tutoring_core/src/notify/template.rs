use super::booking::{BOOKING_CONFIRMATION_BODY, BOOKING_CONFIRMATION_TEMPLATE};
use super::NotifyError;
use handlebars::Handlebars;
use serde_json::Value;

/// Renders a named template with a JSON context.
pub trait TemplateRenderer {
    fn render(&self, template_name: &str, context: &Value) -> Result<String, NotifyError>;
}

impl<T: TemplateRenderer + ?Sized> TemplateRenderer for &T {
    fn render(&self, template_name: &str, context: &Value) -> Result<String, NotifyError> {
        (**self).render(template_name, context)
    }
}

/// Handlebars renderer preloaded with the core's plain-text mail templates.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Builds a renderer with the built-in templates registered.
    pub fn new() -> Result<Self, NotifyError> {
        let mut registry = Handlebars::new();
        // Mail bodies are plain text; HTML escaping would mangle names.
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(BOOKING_CONFIRMATION_TEMPLATE, BOOKING_CONFIRMATION_BODY)
            .map_err(|err| NotifyError::Template(err.to_string()))?;
        Ok(Self { registry })
    }

    /// Registers or replaces a template.
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), NotifyError> {
        self.registry
            .register_template_string(name, source)
            .map_err(|err| NotifyError::Template(err.to_string()))
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template_name: &str, context: &Value) -> Result<String, NotifyError> {
        if !self.registry.has_template(template_name) {
            return Err(NotifyError::Template(format!(
                "unknown template `{template_name}`"
            )));
        }
        self.registry
            .render(template_name, context)
            .map_err(|err| NotifyError::Template(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_template_is_an_error() {
        let renderer = HandlebarsRenderer::new().unwrap();
        let err = renderer.render("missing", &json!({})).unwrap_err();
        assert!(matches!(err, NotifyError::Template(message) if message.contains("missing")));
    }

    #[test]
    fn registered_template_renders_without_html_escaping() {
        let mut renderer = HandlebarsRenderer::new().unwrap();
        renderer.register("greeting", "Hi {{name}}!").unwrap();
        let text = renderer
            .render("greeting", &json!({ "name": "O'Brien & Co" }))
            .unwrap();
        assert_eq!(text, "Hi O'Brien & Co!");
    }
}
