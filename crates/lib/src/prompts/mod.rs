//! # Prompt Template Modules
//!
//! Default prompt templates for each refinement stage. Templates use
//! `{placeholder}` markers filled with [`render`], and every template asks the
//! model to answer inside named boundary tags decoded by [`crate::parser`].

pub mod generation;
pub mod intent;
pub mod quality;
pub mod research;

/// Substitutes each `{key}` in `template` with its value.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::render;

    #[test]
    fn render_replaces_all_occurrences() {
        let out = render("{a} and {a} with {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x with y");
    }
}
