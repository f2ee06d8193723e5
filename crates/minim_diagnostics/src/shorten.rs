//! Path shortening for readable diagnostic locations.

/// Shortens a file path or URL before it is embedded in a message.
pub trait PathShortener {
    /// Returns the display form of `path`.
    fn shorten(&self, path: &str) -> String;
}

impl<F> PathShortener for F
where
    F: Fn(&str) -> String,
{
    fn shorten(&self, path: &str) -> String {
        self(path)
    }
}

/// Rewrites paths under a context directory to be relative to it.
///
/// `http://example.com/www/js/one.js` with context `http://example.com/www/js/`
/// becomes `./one.js`. Paths outside the context are returned unchanged.
#[derive(Clone, Debug)]
pub struct ContextShortener {
    context: String,
}

impl ContextShortener {
    /// Creates a shortener for the given context directory or URL.
    pub fn new(context: impl Into<String>) -> Self {
        let mut context = context.into();
        while context.len() > 1 && context.ends_with('/') {
            context.pop();
        }
        Self { context }
    }
}

impl PathShortener for ContextShortener {
    fn shorten(&self, path: &str) -> String {
        match path.strip_prefix(&self.context) {
            Some("") => ".".to_string(),
            Some(rest) if rest.starts_with('/') => format!(".{rest}"),
            _ => path.to_string(),
        }
    }
}
