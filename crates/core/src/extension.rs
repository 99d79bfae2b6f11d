//! Raw run-property markup.
//!
//! DrawingML run properties support a highlight (`a:highlight`), but the run
//! model here has no attribute for it. As a workaround, such properties are
//! attached to a run as ready-made markup fragments that the deck writer
//! splices into `a:rPr` verbatim. Once the run model grows a real attribute
//! for a property, its fragment builder can be dropped without touching the
//! slide builder.

use crate::types::OutputRun;

/// Markup for a highlight with the given six-digit hex color.
pub fn highlight_markup(hex: &str) -> String {
    format!(r#"<a:highlight><a:srgbClr val="{}"/></a:highlight>"#, hex)
}

impl OutputRun {
    /// Attach a raw run-property fragment to this run.
    ///
    /// The fragment must be well-formed DrawingML valid inside `a:rPr` between
    /// the fill and the typeface elements; it is not validated.
    pub fn attach_raw_extension(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.extensions.push(fragment.into());
        self
    }

    /// Highlight hex color carried by this run's extension markup, if any.
    pub fn highlight_hex(&self) -> Option<&str> {
        const PREFIX: &str = r#"<a:highlight><a:srgbClr val=""#;
        self.extensions
            .iter()
            .find_map(|f| f.strip_prefix(PREFIX))
            .and_then(|rest| rest.get(..6))
    }
}
