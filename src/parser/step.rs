use std::collections::HashMap;

use tracing::debug;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    Null,
    Derived,
}

impl StepValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text that carries content; empty strings count as absent.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.trim().is_empty())
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StepValue::Real(f) => Some(*f),
            StepValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// References held by a list value. A single reference is treated as a
    /// one-element list, since some exporters write `#12` where `(#12)` is due.
    #[must_use]
    pub fn as_references(&self) -> Vec<u64> {
        match self {
            StepValue::List(list) => list.iter().filter_map(StepValue::as_reference).collect(),
            StepValue::Reference(id) => vec![*id],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&StepValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(StepValue::as_text)
    }

    #[must_use]
    pub fn reference(&self, index: usize) -> Option<u64> {
        self.value(index).and_then(StepValue::as_reference)
    }

    #[must_use]
    pub fn references(&self, index: usize) -> Vec<u64> {
        self.value(index).map(StepValue::as_references).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct StepFile {
    pub entities: HashMap<u64, StepEntity>,
    pub schema: String,
}

impl StepFile {
    /// Parses the text of an ISO-10303-21 file.
    ///
    /// Statements may span several lines. Entity instances that cannot be
    /// decoded (complex instances, truncated lines) are skipped.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut entities = HashMap::new();
        let mut schema = String::new();
        let mut in_data = false;
        let mut saw_data = false;
        let mut skipped = 0usize;

        for statement in split_statements(content) {
            let statement = statement.trim();

            if statement.starts_with("FILE_SCHEMA") {
                if let Some(start) = statement.find('\'') {
                    if let Some(end) = statement[start + 1..].find('\'') {
                        schema = statement[start + 1..start + 1 + end].to_string();
                    }
                }
                continue;
            }

            if statement == "DATA" || statement.starts_with("DATA(") {
                in_data = true;
                saw_data = true;
                continue;
            }
            if statement == "ENDSEC" {
                in_data = false;
                continue;
            }

            if in_data && statement.starts_with('#') {
                match Self::parse_entity(statement) {
                    Some(entity) => {
                        entities.insert(entity.id, entity);
                    }
                    None => {
                        skipped += 1;
                        debug!(
                            statement = %truncate(statement, 80),
                            "skipping undecodable STEP statement"
                        );
                    }
                }
            }
        }

        if !saw_data {
            return Err(ParseError::InvalidStep {
                message: "missing DATA section".to_string(),
            });
        }

        debug!(entities = entities.len(), skipped, %schema, "STEP file tokenized");
        Ok(StepFile { entities, schema })
    }

    fn parse_entity(statement: &str) -> Option<StepEntity> {
        // Format: #123=IFCWALL('guid',#ref,'name',...)
        let eq_pos = statement.find('=')?;
        let id: u64 = statement[1..eq_pos].trim().parse().ok()?;

        let rest = statement[eq_pos + 1..].trim();
        let paren_pos = rest.find('(')?;
        let entity_type = rest[..paren_pos].trim().to_ascii_uppercase();
        // Complex instances look like #1=(IFCA(...)IFCB(...)) and carry no single type
        if entity_type.is_empty() || !rest.ends_with(')') {
            return None;
        }

        let values = parse_values(&rest[paren_pos + 1..rest.len() - 1]);

        Some(StepEntity {
            id,
            entity_type,
            values,
        })
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Entities of the given type, ordered by instance id.
    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        let mut found: Vec<&StepEntity> = self
            .entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }
}

/// Splits file content on `;` terminators outside string literals and comments.
fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                // '' inside a string toggles twice and stays in the string
                in_string = !in_string;
                current.push(ch);
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' if !in_string => {
                statements.push(std::mem::take(&mut current));
            }
            '\r' | '\n' if !in_string => {}
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}

fn parse_values(s: &str) -> Vec<StepValue> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut paren_depth = 0i32;

    for ch in s.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '(' if !in_string => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' if !in_string => {
                paren_depth -= 1;
                current.push(ch);
            }
            ',' if !in_string && paren_depth == 0 => {
                values.push(parse_single_value(current.trim()));
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        values.push(parse_single_value(current.trim()));
    }

    values
}

fn parse_single_value(s: &str) -> StepValue {
    let s = s.trim();

    if s == "$" || s.is_empty() {
        return StepValue::Null;
    }
    if s == "*" {
        return StepValue::Derived;
    }
    if let Some(stripped) = s.strip_prefix('#') {
        if let Ok(id) = stripped.trim().parse::<u64>() {
            return StepValue::Reference(id);
        }
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return StepValue::String(decode_step_string(&s[1..s.len() - 1]));
    }
    if s.len() >= 2 && s.starts_with('.') && s.ends_with('.') {
        return match &s[1..s.len() - 1] {
            "T" => StepValue::Boolean(true),
            "F" => StepValue::Boolean(false),
            inner => StepValue::Enum(inner.to_string()),
        };
    }
    if s.starts_with('(') && s.ends_with(')') {
        return StepValue::List(parse_values(&s[1..s.len() - 1]));
    }
    if let Ok(i) = s.parse::<i64>() {
        return StepValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return StepValue::Real(f);
    }
    // Typed value like IFCLENGTHMEASURE(1.2) or IFCLABEL('x')
    if let Some(paren_pos) = s.find('(') {
        if s.ends_with(')') {
            return parse_single_value(&s[paren_pos + 1..s.len() - 1]);
        }
    }

    StepValue::String(s.to_string())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Decode STEP/IFC encoded strings with escape sequences.
/// Supports:
/// - `\X2\XXXX\X0\` - UCS-2 code units, any number of 4-char groups
/// - `\X4\XXXXXXXX\X0\` - UCS-4 code points
/// - `\X\XX` - 1-byte ISO 8859-1
/// - `\S\c` - high-bit shift of one character
/// - `\\` - escaped backslash
/// - `''` - escaped apostrophe
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some('X') => {
                    chars.next();
                    match chars.peek().copied() {
                        Some(width @ ('2' | '4')) => {
                            chars.next();
                            chars.next(); // '\'
                            let mut hex = String::new();
                            while let Some(&c) = chars.peek() {
                                if c == '\\' {
                                    break;
                                }
                                hex.push(c);
                                chars.next();
                            }
                            // terminator \X0\
                            for _ in 0..4 {
                                chars.next();
                            }
                            let group = if width == '2' { 4 } else { 8 };
                            push_hex_groups(&mut result, &hex, group);
                        }
                        Some('\\') => {
                            chars.next();
                            let hex: String = chars.by_ref().take(2).collect();
                            if let Ok(code) = u8::from_str_radix(&hex, 16) {
                                result.push(char::from(code));
                            }
                        }
                        _ => result.push_str("\\X"),
                    }
                }
                Some('S') => {
                    chars.next(); // 'S'
                    chars.next(); // '\'
                    if let Some(c) = chars.next().and_then(|c| char::from_u32(u32::from(c) + 128)) {
                        result.push(c);
                    }
                }
                Some('\\') => {
                    chars.next();
                    result.push('\\');
                }
                _ => result.push('\\'),
            },
            '\'' => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                }
                result.push('\'');
            }
            _ => result.push(ch),
        }
    }

    result
}

fn push_hex_groups(out: &mut String, hex: &str, group: usize) {
    let units: Vec<u32> = hex
        .as_bytes()
        .chunks(group)
        .filter(|chunk| chunk.len() == group)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u32::from_str_radix(s, 16).ok())
        .collect();

    if group == 4 {
        let utf16: Vec<u16> = units.iter().map(|&u| u as u16).collect();
        out.extend(char::decode_utf16(utf16).filter_map(Result::ok));
    } else {
        out.extend(units.into_iter().filter_map(char::from_u32));
    }
}
