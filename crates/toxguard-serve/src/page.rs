//! Result page rendering
//!
//! The page shell lives in `templates/index.html` and is embedded into the
//! binary. A scored submission is rendered as an HTML block spliced in at the
//! `<!-- result -->` marker.

use crate::error::AppError;
use rust_embed::Embed;
use std::fmt::Write;
use toxguard_core::Prediction;

#[derive(Embed)]
#[folder = "templates"]
struct Templates;

const INDEX: &str = "index.html";
const RESULT_MARKER: &str = "<!-- result -->";

/// Formatted view of one scored comment, percentages with two decimals
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreView {
    pub comment: String,
    pub toxicity: String,
    pub classification: &'static str,
    /// Display name and percentage per subtype
    pub subtypes: Vec<(&'static str, String)>,
    pub conf_appropriate: String,
    pub conf_inappropriate: String,
}

impl ScoreView {
    pub fn new(comment: impl Into<String>, prediction: &Prediction) -> Self {
        Self {
            comment: comment.into(),
            toxicity: format!("{}%", percent(prediction.toxicity)),
            classification: prediction.label().as_str(),
            subtypes: prediction
                .subtype_scores()
                .map(|(label, score)| (label.display_name(), format!("{}%", percent(score))))
                .collect(),
            conf_appropriate: percent(1.0 - prediction.toxicity),
            conf_inappropriate: percent(prediction.toxicity),
        }
    }

    fn to_html(&self) -> String {
        let mut html = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            html,
            r#"<section class="result">
        <h2>Result</h2>
        <blockquote>{comment}</blockquote>
        <p>Toxicity: <strong>{toxicity}</strong></p>
        <p>Classification: <strong class="label-{class}">{class}</strong></p>
        <div class="bar">
            <div class="ok" style="width: {ok}%"></div>
            <div class="bad" style="width: {bad}%"></div>
        </div>
        <p>Appropriate {ok}% / Inappropriate {bad}%</p>
        <table>
"#,
            comment = escape_html(&self.comment),
            toxicity = self.toxicity,
            class = self.classification,
            ok = self.conf_appropriate,
            bad = self.conf_inappropriate,
        );
        for (name, score) in &self.subtypes {
            let _ = writeln!(
                html,
                r#"            <tr><td>{}</td><td class="score">{}</td></tr>"#,
                name, score
            );
        }
        html.push_str("        </table>\n    </section>");
        html
    }
}

fn percent(probability: f32) -> String {
    format!("{:.2}", probability * 100.0)
}

/// Render the form page, with the result block when a comment was scored
pub fn render(result: Option<&ScoreView>) -> Result<String, AppError> {
    fill(&result.map(ScoreView::to_html).unwrap_or_default())
}

/// Render the form page with a message in place of a result
pub fn render_notice(message: &str) -> Result<String, AppError> {
    fill(&format!(
        r#"<p class="notice">{}</p>"#,
        escape_html(message)
    ))
}

fn fill(block: &str) -> Result<String, AppError> {
    let template = Templates::get(INDEX)
        .ok_or_else(|| AppError::Internal(format!("template {} is not embedded", INDEX)))?;
    let page = String::from_utf8_lossy(&template.data);
    Ok(page.replace(RESULT_MARKER, block))
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction() -> Prediction {
        Prediction::new(0.8123, [0.1, 0.02, 0.0, 0.655, 0.51, 0.0])
    }

    #[test]
    fn test_score_view_formatting() {
        let view = ScoreView::new("you are awful", &prediction());
        assert_eq!(view.toxicity, "81.23%");
        assert_eq!(view.classification, "Inappropriate");
        assert_eq!(view.conf_inappropriate, "81.23");
        assert_eq!(view.conf_appropriate, "18.77");
        assert_eq!(view.subtypes[0], ("Severe Toxicity", "10.00%".to_string()));
        assert_eq!(view.subtypes[3], ("Insult", "65.50%".to_string()));
        assert_eq!(view.subtypes.len(), 6);
    }

    #[test]
    fn test_empty_form_has_no_result() {
        let page = render(None).unwrap();
        assert!(page.contains(r#"name="comment""#));
        assert!(!page.contains("Classification:"));
        assert!(!page.contains(RESULT_MARKER));
    }

    #[test]
    fn test_rendered_comment_is_escaped() {
        let view = ScoreView::new("<script>alert('x')</script> & co", &prediction());
        let page = render(Some(&view)).unwrap();
        assert!(page.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt; &amp; co"));
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("Sexual Explicit"));
    }

    #[test]
    fn test_notice_replaces_result() {
        let page = render_notice("Enter a comment <first>").unwrap();
        assert!(page.contains(r#"<p class="notice">Enter a comment &lt;first&gt;</p>"#));
        assert!(!page.contains("Classification:"));
        assert!(!page.contains(RESULT_MARKER));
    }

    #[test]
    fn test_escape_passthrough() {
        assert_eq!(escape_html("plain text"), "plain text");
        assert_eq!(escape_html("\"q\""), "&quot;q&quot;");
    }
}
