use std::collections::BTreeMap;

/// Recognized names for the task template, lower-cased.
pub const TASK_TEMPLATE_ALIASES: [&str; 2] = ["task", "tâche"];

/// Field mapping of a task template, keys lower-cased.
pub type TemplateFieldSet = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCall {
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageComponent {
    Template(TemplateCall),
    Text(String),
}

/// Ordered components of a parsed page: top-level template invocations and
/// the text runs between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStructure {
    pub components: Vec<PageComponent>,
}

impl PageStructure {
    /// Scans page text for top-level `{{Name|field=value|...}}` invocations.
    /// Nested braces and links inside parameter values are kept verbatim.
    /// An unbalanced opening brace turns the remainder into a text component.
    pub fn parse(text: &str) -> Self {
        let mut components = Vec::new();
        let mut cursor = 0usize;

        while let Some(offset) = text[cursor..].find("{{") {
            let open = cursor + offset;
            let Some(close) = matching_close(text, open) else {
                break;
            };
            if open > cursor {
                push_text(&mut components, &text[cursor..open]);
            }
            components.push(PageComponent::Template(parse_template(
                &text[open + 2..close],
            )));
            cursor = close + 2;
        }

        if cursor < text.len() {
            push_text(&mut components, &text[cursor..]);
        }

        Self { components }
    }
}

/// Returns the field mapping of the first task template in the structure,
/// keys lower-cased. Absent structure or no matching template yields an
/// empty mapping.
pub fn task_template_fields(structure: Option<&PageStructure>) -> TemplateFieldSet {
    let Some(structure) = structure else {
        return TemplateFieldSet::new();
    };

    for component in &structure.components {
        let PageComponent::Template(call) = component else {
            continue;
        };
        let name = call.name.to_lowercase();
        if TASK_TEMPLATE_ALIASES.contains(&name.as_str()) {
            return call
                .fields
                .iter()
                .map(|(key, value)| (key.to_lowercase(), value.clone()))
                .collect();
        }
    }

    TemplateFieldSet::new()
}

fn push_text(components: &mut Vec<PageComponent>, text: &str) {
    if !text.trim().is_empty() {
        components.push(PageComponent::Text(text.to_string()));
    }
}

/// Index of the `}}` matching the `{{` at `open`, accounting for nesting.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut index = open;
    while index + 1 < bytes.len() {
        if bytes[index] == b'{' && bytes[index + 1] == b'{' {
            depth += 1;
            index += 2;
        } else if bytes[index] == b'}' && bytes[index + 1] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
            index += 2;
        } else {
            index += 1;
        }
    }
    None
}

fn parse_template(inner: &str) -> TemplateCall {
    let mut parts = Vec::new();
    let bytes = inner.as_bytes();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut index = 0usize;

    while index < bytes.len() {
        match bytes[index] {
            b'{' | b'[' if index + 1 < bytes.len() && bytes[index + 1] == bytes[index] => {
                depth += 1;
                index += 2;
            }
            b'}' | b']' if index + 1 < bytes.len() && bytes[index + 1] == bytes[index] => {
                depth = depth.saturating_sub(1);
                index += 2;
            }
            b'|' if depth == 0 => {
                parts.push(&inner[start..index]);
                start = index + 1;
                index += 1;
            }
            _ => index += 1,
        }
    }
    parts.push(&inner[start..]);

    let mut fields = BTreeMap::new();
    let mut positional = 0usize;
    for part in parts.iter().skip(1) {
        if let Some((key, value)) = part.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), value.trim().to_string());
        } else {
            positional += 1;
            fields.insert(positional.to_string(), part.trim().to_string());
        }
    }

    TemplateCall {
        name: parts[0].trim().to_string(),
        fields,
    }
}
