//! Structural comments for emitted Python.
//!
//! Annotation lines start with [`ANNOTATION_MARKER`] at the indentation of the
//! line they describe. No generator emits a line with that prefix outside a
//! string literal, so [`strip_annotations`] can remove exactly what
//! [`annotate`] added.

use crate::runtime;

/// Prefix of every annotation line, after indentation.
pub const ANNOTATION_MARKER: &str = "## ";

/// Decorates the structural boundaries of a fragment with comments.
///
/// Existing annotations are stripped first, so applying this twice yields the
/// same lines as applying it once. Lines inside triple-quoted strings are
/// never touched, and a comment for a decorated definition goes above its
/// first decorator.
pub fn annotate(lines: &[String], fragment: &str) -> Vec<String> {
    let lines = strip_annotations(lines);
    let mut out = Vec::with_capacity(lines.len() + lines.len() / 4 + 1);

    // An interpreter line has to stay first.
    let skip = usize::from(lines.first().is_some_and(|l| l.starts_with("#!")));
    out.extend(lines[..skip].iter().cloned());
    out.push(format!("{}fragment: {}", ANNOTATION_MARKER, fragment));

    let mut in_string = false;
    let mut after_decorator = false;
    for (i, line) in lines.iter().enumerate().skip(skip) {
        if !in_string {
            if let Some(note) = describe(&lines, i, after_decorator) {
                out.push(format!(
                    "{}{}{}",
                    &line[..indent_width(line)],
                    ANNOTATION_MARKER,
                    note.replace('"', "")
                ));
            }
            let trimmed = line.trim_start();
            if indent_width(line) == 0 && !trimmed.is_empty() {
                after_decorator = trimmed.starts_with('@');
            }
        }
        in_string ^= toggles_string(line);
        out.push(line.clone());
    }
    out
}

/// Removes every annotation line, leaving all other lines untouched and in order.
pub fn strip_annotations(lines: &[String]) -> Vec<String> {
    let mut in_string = false;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if !in_string && line.trim_start().starts_with(ANNOTATION_MARKER) {
            continue;
        }
        in_string ^= toggles_string(line);
        out.push(line.clone());
    }
    out
}

fn describe(lines: &[String], i: usize, after_decorator: bool) -> Option<String> {
    let line = &lines[i];
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return None;
    }

    if indent_width(line) > 0 {
        let key = trimmed
            .strip_prefix("if node_id == ")
            .or_else(|| trimmed.strip_prefix("elif node_id == "))?;
        let key = key.trim_end_matches(':').trim_matches('"');
        let reads = branch_reads(lines, i);
        return Some(if reads.is_empty() {
            format!("branch {}", key)
        } else {
            format!("branch {} reads {}", key, reads.join(", "))
        });
    }

    if after_decorator {
        return None;
    }
    if trimmed.starts_with('@') {
        return lines[i + 1..]
            .iter()
            .find(|l| definition(l).is_some())
            .and_then(|l| definition(l));
    }
    definition(trimmed).or_else(|| constant(trimmed))
}

fn definition(line: &str) -> Option<String> {
    let (kind, rest) = if let Some(rest) = line.strip_prefix("async def ") {
        ("handler", rest)
    } else if let Some(rest) = line.strip_prefix("def ") {
        ("function", rest)
    } else if let Some(rest) = line.strip_prefix("class ") {
        ("class", rest)
    } else {
        return None;
    };
    let name = identifier_prefix(rest);
    (!name.is_empty()).then(|| format!("{} {}", kind, name))
}

fn constant(line: &str) -> Option<String> {
    let name = identifier_prefix(line);
    let is_constant = !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && line[name.len()..].trim_start().starts_with('=');
    is_constant.then(|| format!("constant {}", name))
}

/// Variables read by the first `render_text` call inside the branch at `i`.
fn branch_reads(lines: &[String], i: usize) -> Vec<String> {
    let depth = indent_width(&lines[i]);
    lines[i + 1..]
        .iter()
        .take_while(|l| l.trim().is_empty() || indent_width(l) > depth)
        .find(|l| l.contains("render_text("))
        .map(|l| runtime::placeholders(l))
        .unwrap_or_default()
}

fn identifier_prefix(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn toggles_string(line: &str) -> bool {
    line.matches("\"\"\"").count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(src: &str) -> Vec<String> {
        src.lines().map(str::to_string).collect()
    }

    #[test]
    fn comment_goes_above_first_decorator() {
        let src = lines("@dp.message(Command(\"start\"))\nasync def start_handler(message):\n    pass");
        let out = annotate(&src, "handlers");
        assert_eq!(out[0], "## fragment: handlers");
        assert_eq!(out[1], "## handler start_handler");
        assert_eq!(out[2], "@dp.message(Command(\"start\"))");
        assert_eq!(out[3], "async def start_handler(message):");
    }

    #[test]
    fn branches_are_annotated_with_the_variables_they_read() {
        let src = lines(concat!(
            "async def navigate_to_node(message, node_id):\n",
            "    if node_id == \"welcome\":\n",
            "        text = await render_text(\"Hi {user_name}\", message)\n",
            "    else:\n",
            "        logging.warning(f\"Unknown navigation target: {node_id}\")",
        ));
        let out = annotate(&src, "navigation");
        assert!(out.contains(&"    ## branch welcome reads user_name".to_string()));
        assert!(!out.iter().any(|l| l.contains("## branch node_id")));
    }

    #[test]
    fn lines_inside_triple_quoted_strings_are_untouched() {
        let src = lines("QUERY = \"\"\"\ndef not_code():\n\"\"\"\nLIMIT = 3");
        let out = annotate(&src, "persistence");
        assert_eq!(
            out,
            lines("## fragment: persistence\n## constant QUERY\nQUERY = \"\"\"\ndef not_code():\n\"\"\"\n## constant LIMIT\nLIMIT = 3")
        );
    }

    #[test]
    fn lowercase_assignments_are_not_constants() {
        let src = lines("user_data = {}\nbot = Bot(token=BOT_TOKEN)");
        let out = annotate(&src, "bootstrap");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn interpreter_line_stays_first() {
        let src = lines("#!/usr/bin/env python3\nimport os");
        let out = annotate(&src, "preamble");
        assert_eq!(out, lines("#!/usr/bin/env python3\n## fragment: preamble\nimport os"));
        assert_eq!(annotate(&out, "preamble"), out);
    }

    fn source_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("def helper(x):".to_string()),
            Just("async def handler(message):".to_string()),
            Just("@dp.callback_query(F.data == \"a\")".to_string()),
            Just("class Context:".to_string()),
            Just("ADMIN_IDS = [1, 2]".to_string()),
            Just("    if node_id == \"a\":".to_string()),
            Just("    elif node_id == \"b\":".to_string()),
            Just("        text = await render_text(\"{name}\", message)".to_string()),
            Just("    return None".to_string()),
            Just("\"\"\"".to_string()),
            Just("    \"\"\"Docstring.\"\"\"".to_string()),
            Just(String::new()),
            "[a-z ]{0,12}",
        ]
    }

    proptest! {
        #[test]
        fn annotate_is_idempotent(src in prop::collection::vec(source_line(), 0..40)) {
            let once = annotate(&src, "handlers");
            let twice = annotate(&once, "handlers");
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn stripping_restores_the_input(src in prop::collection::vec(source_line(), 0..40)) {
            prop_assert_eq!(strip_annotations(&annotate(&src, "entry")), src);
        }
    }
}
