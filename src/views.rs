//! HTML pages for the browser flow

use std::fmt::Write;

use crate::inference::ModelStore;
use crate::models::{FieldBag, PredictionResult, FIELDS, MODEL_TYPE_KEY};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f4f6f9; margin: 0; padding: 2rem; }
.card { max-width: 640px; margin: 0 auto; background: #fff; border-radius: 8px; padding: 2rem; box-shadow: 0 2px 8px rgba(0,0,0,.08); }
label { display: block; margin-top: .8rem; font-weight: 600; }
input, select { width: 100%; padding: .5rem; margin-top: .25rem; box-sizing: border-box; }
button, .button { margin-top: 1.5rem; padding: .6rem 1.2rem; background: #0d6efd; color: #fff; border: 0; border-radius: 4px; text-decoration: none; display: inline-block; }
.alert { padding: .8rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.alert-success { background: #d1e7dd; color: #0f5132; }
.alert-danger { background: #f8d7da; color: #842029; }
.alert-warning { background: #fff3cd; color: #664d03; }
.muted { color: #6c757d; font-size: .9rem; }
"#;

/// Escape text for HTML element and attribute content
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"card\">\n{}</div>\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

/// Input form. `values` refills the fields after a failed submission.
pub fn render_form(store: &ModelStore, values: &FieldBag, error: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str("<h1>IoT Threat Analysis</h1>\n");
    body.push_str("<p class=\"muted\">Submit one telemetry observation to classify it.</p>\n");

    if let Some(error) = error {
        let _ = writeln!(body, "<div class=\"alert alert-danger\">{}</div>", escape(error));
    }
    if store.loaded_count() == 0 {
        body.push_str(
            "<div class=\"alert alert-warning\">No trained model is loaded; \
             results come from a severity heuristic.</div>\n",
        );
    }

    body.push_str("<form method=\"post\" action=\"/analyze\">\n");

    for spec in FIELDS.iter() {
        let value = escape(values.field(spec).unwrap_or_default());
        let _ = writeln!(body, "<label for=\"{0}\">{1}</label>", spec.key, escape(spec.column));

        if spec.numeric {
            let _ = writeln!(
                body,
                "<input type=\"number\" step=\"any\" id=\"{0}\" name=\"{0}\" value=\"{1}\" required>",
                spec.key, value
            );
            continue;
        }

        let options = store.category_options(spec.column);
        if options.is_empty() {
            let _ = writeln!(
                body,
                "<input type=\"text\" id=\"{0}\" name=\"{0}\" value=\"{1}\" required>",
                spec.key, value
            );
        } else {
            let _ = writeln!(
                body,
                "<input type=\"text\" id=\"{0}\" name=\"{0}\" value=\"{1}\" list=\"{0}_options\" required>",
                spec.key, value
            );
            let _ = write!(body, "<datalist id=\"{}_options\">", spec.key);
            for option in &options {
                let _ = write!(body, "<option value=\"{}\">", escape(option));
            }
            body.push_str("</datalist>\n");
        }
    }

    let entries = store.entries();
    if entries.len() > 1 {
        let selected = store.lookup(values.model_type()).name.as_str();
        let _ = writeln!(body, "<label for=\"{0}\">Model</label>\n<select id=\"{0}\" name=\"{0}\">", MODEL_TYPE_KEY);
        for entry in entries {
            let _ = writeln!(
                body,
                "<option value=\"{}\"{}>{}{}</option>",
                escape(&entry.name),
                if entry.name == selected { " selected" } else { "" },
                escape(&entry.display_name()),
                if entry.is_loaded() { "" } else { " (unavailable)" }
            );
        }
        body.push_str("</select>\n");
    }

    body.push_str("<button type=\"submit\">Analyze</button>\n</form>\n");
    page("IoT Threat Analysis", &body)
}

/// Verdict page for a successful prediction
pub fn render_result(result: &PredictionResult) -> String {
    let verdict = result.verdict();
    let mut body = String::new();

    body.push_str("<h1>Analysis Result</h1>\n");
    let _ = writeln!(
        body,
        "<div class=\"alert alert-{}\"><h2>{} {}</h2><p>{}</p></div>",
        verdict.color,
        verdict.icon,
        escape(verdict.status),
        escape(verdict.message)
    );
    let _ = writeln!(body, "<p><strong>Confidence:</strong> {:.1}%</p>", result.confidence);
    let _ = writeln!(body, "<p><strong>Recommendation:</strong> {}</p>", escape(verdict.recommendation));
    let _ = writeln!(body, "<p class=\"muted\">Model used: {}</p>", escape(&result.model_used));
    body.push_str("<a class=\"button\" href=\"/\">Analyze another</a>\n");

    page("Analysis Result", &body)
}
