//! Comment rendering: turn a merged entry back into comment text.

use crate::model::DocEntry;

/// Block tags in the order they conventionally appear. Anything else
/// follows, alphabetically.
const TAG_ORDER: &[&str] = &[
    "author",
    "version",
    "param",
    "return",
    "throws",
    "exception",
    "see",
    "since",
    "serial",
    "deprecated",
];

fn tag_line(name: &str, content: &str) -> String {
    format!("@{} {}", name, content).trim_end().to_string()
}

/// `@param` lines rebuilt from positional docs; type parameters first.
fn param_lines(entry: &DocEntry, parameters: &[String], type_parameters: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut positional = |names: Vec<String>, docs: &Option<Vec<String>>| {
        let Some(docs) = docs else { return };
        if docs.len() > names.len() {
            tracing::debug!(
                declared = names.len(),
                documented = docs.len(),
                "dropping parameter docs beyond the declared parameters"
            );
        }
        for (name, doc) in names.iter().zip(docs) {
            if !doc.is_empty() {
                lines.push(tag_line("param", &format!("{} {}", name, doc)));
            }
        }
    };
    positional(
        type_parameters.iter().map(|t| format!("<{}>", t)).collect(),
        &entry.type_parameters,
    );
    positional(parameters.to_vec(), &entry.parameters);
    lines
}

/// Render `entry` as comment text (without comment delimiters): the body,
/// a blank line, then one line per block tag.
pub fn render_comment(entry: &DocEntry, parameters: &[String], type_parameters: &[String]) -> String {
    let mut order: Vec<&str> = TAG_ORDER.to_vec();
    order.extend(
        entry
            .tags
            .keys()
            .map(String::as_str)
            .filter(|name| !TAG_ORDER.contains(name)),
    );

    let mut lines = Vec::new();
    for name in order {
        if name == "param" {
            lines.extend(param_lines(entry, parameters, type_parameters));
        }
        for content in entry.tags.get(name).into_iter().flatten() {
            lines.push(tag_line(name, content));
        }
    }

    let body = entry.body.as_deref().unwrap_or("");
    match (body.is_empty(), lines.is_empty()) {
        (_, true) => body.to_string(),
        (true, false) => lines.join("\n"),
        (false, false) => format!("{}\n\n{}", body, lines.join("\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn body_only() {
        let entry = DocEntry::with_body("Does X. Also Y.");
        assert_eq!(render_comment(&entry, &[], &[]), "Does X. Also Y.");
    }

    #[test]
    fn tags_follow_conventional_order() {
        let mut entry = DocEntry::with_body("Runs.");
        entry.tags.insert("since".to_string(), names(&["1.0"]));
        entry.tags.insert("apiNote".to_string(), names(&["Careful."]));
        entry.tags.insert("return".to_string(), names(&["the result"]));
        entry.tags.insert("author".to_string(), names(&["someone"]));
        entry.parameters = Some(names(&["the count", ""]));
        entry.type_parameters = Some(names(&["the type"]));

        let rendered = render_comment(&entry, &names(&["n", "flag"]), &names(&["T"]));
        assert_eq!(
            rendered,
            "Runs.\n\n@author someone\n@param <T> the type\n@param n the count\n\
             @return the result\n@since 1.0\n@apiNote Careful."
        );
    }

    #[test]
    fn leftover_param_tags_follow_positional_ones() {
        let mut entry = DocEntry::default();
        entry.tags.insert("param".to_string(), names(&["old stale"]));
        entry.parameters = Some(names(&["the a"]));
        assert_eq!(
            render_comment(&entry, &names(&["a"]), &[]),
            "@param a the a\n@param old stale"
        );
    }

    #[test]
    fn extra_parameter_docs_are_dropped() {
        let entry = DocEntry {
            parameters: Some(names(&["one", "two"])),
            ..Default::default()
        };
        assert_eq!(render_comment(&entry, &names(&["a"]), &[]), "@param a one");
    }
}
