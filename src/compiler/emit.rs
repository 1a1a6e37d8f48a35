//! Line-oriented source writer used by every fragment generator.

const INDENT: &str = "    ";

/// Accumulates emitted lines with indentation baked in.
#[derive(Debug, Default)]
pub struct SourceWriter {
    lines: Vec<String>,
    indent_level: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes one line at the current indentation. Empty text yields a bare blank line.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines
                .push(format!("{}{}", INDENT.repeat(self.indent_level), text));
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Pushes every line of a multi-line snippet, keeping its relative indentation.
    pub fn snippet(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            self.line(line);
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    /// Emits `header` and runs `body` one level deeper.
    pub fn block(&mut self, header: impl AsRef<str>, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.line(header);
        self.indent();
        body(self);
        self.dedent();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn finish(self) -> Vec<String> {
        self.lines
    }
}

/// Renders `value` as a double-quoted Python string literal.
pub fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32 & 0xff)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Renders an optional string as a Python literal or `None`.
pub fn py_opt_str(value: Option<&str>) -> String {
    value.map(py_str).unwrap_or_else(|| "None".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_indents_body() {
        let mut w = SourceWriter::new();
        w.block("def f():", |w| {
            w.line("return 1");
        });
        w.line("x = f()");
        assert_eq!(w.finish(), vec!["def f():", "    return 1", "x = f()"]);
    }

    #[test]
    fn py_str_escapes_quotes_and_newlines() {
        assert_eq!(py_str("say \"hi\"\nnow"), r#""say \"hi\"\nnow""#);
        assert_eq!(py_str(r"C:\bot"), r#""C:\\bot""#);
    }

    #[test]
    fn control_characters_use_hex_escapes() {
        assert_eq!(py_str("\u{7}"), r#""\x07""#);
    }
}
