use std::collections::BTreeMap;

use promcfg_common::Error;

// actions that open a block and must be closed by {{ end }}
const BLOCK_ACTIONS: [&str; 5] = ["define", "if", "range", "with", "block"];

pub fn parse_templates(text: &str) -> Result<BTreeMap<String, String>, Error> {
    let mut templates = BTreeMap::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find("{{") {
        let action_start = i + offset;
        let (action, after) = read_action(text, action_start)?;
        if first_word(&action) != "define" {
            i = after;
            continue;
        }

        let name = define_name(&action)?;
        let body_start = after;
        let mut depth = 0usize;
        let mut j = after;
        loop {
            let offset = text[j..]
                .find("{{")
                .ok_or_else(|| unterminated(&name))?;
            let inner_start = j + offset;
            let (inner, inner_after) = read_action(text, inner_start)?;
            let word = first_word(&inner);
            if BLOCK_ACTIONS.contains(&word.as_str()) {
                depth += 1;
            } else if word == "end" {
                if depth == 0 {
                    templates.insert(name, text[body_start..inner_start].to_string());
                    i = inner_after;
                    break;
                }
                depth -= 1;
            }
            j = inner_after;
        }
    }
    Ok(templates)
}

pub fn validate_body(body: &str) -> Result<(), Error> {
    let mut depth = 0i64;
    let mut i = 0;
    while let Some(offset) = body[i..].find("{{") {
        let action_start = i + offset;
        let (action, after) = read_action(body, action_start)?;
        let word = first_word(&action);
        if BLOCK_ACTIONS.contains(&word.as_str()) {
            depth += 1;
        } else if word == "end" {
            depth -= 1;
            if depth < 0 {
                return Err(Error::Parse(
                    "error parsing template: unexpected {{ end }}".into(),
                ));
            }
        }
        i = after;
    }
    if depth != 0 {
        return Err(Error::Parse(
            "error parsing template: unclosed block action".into(),
        ));
    }
    Ok(())
}

pub fn render(templates: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (name, body) in templates {
        out.push_str(&format!("{{{{ define \"{name}\" }}}}{body}{{{{ end }}}}\n"));
    }
    out
}

fn read_action(text: &str, start: usize) -> Result<(String, usize), Error> {
    let inner_start = start + 2;
    let close = text[inner_start..]
        .find("}}")
        .ok_or_else(|| Error::Parse("error parsing template: unclosed action".into()))?;
    let mut inner = text[inner_start..inner_start + close].trim();
    if let Some(stripped) = inner.strip_prefix('-') {
        inner = stripped.trim_start();
    }
    if let Some(stripped) = inner.strip_suffix('-') {
        inner = stripped.trim_end();
    }
    Ok((inner.to_string(), inner_start + close + 2))
}

fn first_word(action: &str) -> String {
    action.split_whitespace().next().unwrap_or("").to_string()
}

fn define_name(action: &str) -> Result<String, Error> {
    let rest = action
        .strip_prefix("define")
        .unwrap_or_default()
        .trim_start();
    let rest = rest.strip_prefix('"').ok_or_else(|| {
        Error::Parse("error parsing template: define requires a quoted name".into())
    })?;
    let close = rest.find('"').ok_or_else(|| {
        Error::Parse("error parsing template: define requires a quoted name".into())
    })?;
    Ok(rest[..close].to_string())
}

fn unterminated(name: &str) -> Error {
    Error::Parse(format!(
        "error parsing template: unexpected EOF in template \"{name}\""
    ))
}
