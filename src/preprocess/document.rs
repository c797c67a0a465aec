//! Minimal section model of a unit file.
//!
//! Lines are kept byte-for-byte; rendering a parsed document without edits
//! reproduces the input exactly.

/// A `[Name]` header and the lines that follow it up to the next header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    header: String,
    lines: Vec<String>,
}

impl Section {
    /// Section name without brackets.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a non-comment line in this section assigns `directive`.
    #[must_use]
    pub fn has_directive(&self, directive: &str) -> bool {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .any(|l| {
                l.strip_prefix(directive)
                    .is_some_and(|rest| rest.starts_with('='))
            })
    }

    /// Insert `line` directly after the header.
    pub fn insert_after_header(&mut self, line: String) {
        self.lines.insert(0, line);
    }
}

/// A unit file split into a preamble and ordered sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDocument {
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl UnitDocument {
    /// Split `content` on `\n` and group lines under section headers.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut preamble = Vec::new();
        let mut sections: Vec<Section> = Vec::new();

        for line in content.split('\n') {
            if let Some(name) = header_name(line) {
                sections.push(Section {
                    name: name.to_string(),
                    header: line.to_string(),
                    lines: Vec::new(),
                });
            } else if let Some(current) = sections.last_mut() {
                current.lines.push(line.to_string());
            } else {
                preamble.push(line.to_string());
            }
        }

        Self { preamble, sections }
    }

    /// First section called `name`.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Reassemble the document.
    #[must_use]
    pub fn render(&self) -> String {
        let lines = self.preamble.iter().chain(
            self.sections
                .iter()
                .flat_map(|s| std::iter::once(&s.header).chain(&s.lines)),
        );
        lines.map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Name inside `[...]` when `line` is a section header.
fn header_name(line: &str) -> Option<&str> {
    line.trim().strip_prefix('[')?.strip_suffix(']')
}
