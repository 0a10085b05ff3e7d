//! Reference scan: which context names does a template read?
//!
//! Tera only reports an undefined variable when the offending branch is
//! actually rendered, so a typo inside `{% if UseDocker %}` would go
//! unnoticed until someone enables Docker. The loader instead scans every
//! template up front and rejects names that no variable declares.
//!
//! The scan is lexical and lenient. It reads the expressions
//! inside `{{ .. }}` and the `if`, `elif`, `for` and `set` tags, and reports
//! the first segment of every variable path (`blueprint` for
//! `blueprint.name`). Names bound by the template itself (loop variables,
//! `set` targets, macro parameters, import aliases) are excluded, as are
//! filter, test and function names, keyword arguments and Tera keywords.

use std::collections::BTreeSet;

const KEYWORDS: &[&str] = &[
    "and",
    "or",
    "not",
    "in",
    "is",
    "as",
    "true",
    "false",
    "True",
    "False",
    "loop",
    "super",
    "self",
    "__tera_context",
];

enum Tag<'a> {
    Expression(&'a str),
    Statement(&'a str),
}

/// Returns the free context names read by `source`.
pub fn free_variables(source: &str) -> BTreeSet<String> {
    let tags = split_tags(source);

    let mut locals = BTreeSet::new();
    for tag in &tags {
        if let Tag::Statement(body) = tag {
            collect_locals(body, &mut locals);
        }
    }

    let mut found = BTreeSet::new();
    for tag in &tags {
        let expression = match tag {
            Tag::Expression(body) => Some(*body),
            Tag::Statement(body) => statement_expression(body),
        };
        if let Some(expression) = expression {
            scan_expression(expression, &mut found);
        }
    }

    found.retain(|name| !locals.contains(name));
    found
}

fn split_tags(source: &str) -> Vec<Tag<'_>> {
    let mut tags = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find('{') {
        let after = &rest[start..];
        let (close, is_statement) = if after.starts_with("{{") {
            ("}}", false)
        } else if after.starts_with("{%") {
            ("%}", true)
        } else if after.starts_with("{#") {
            match after.find("#}") {
                Some(end) => {
                    rest = &after[end + 2..];
                    continue;
                }
                None => break,
            }
        } else {
            rest = &after[1..];
            continue;
        };

        let Some(end) = after[2..].find(close) else {
            break;
        };
        let body = trim_body(&after[2..2 + end]);
        rest = &after[2 + end + 2..];

        if !is_statement {
            tags.push(Tag::Expression(body));
            continue;
        }
        if body == "raw" {
            match rest.find("endraw").and_then(|i| rest[i..].find("%}").map(|j| i + j)) {
                Some(end) => rest = &rest[end + 2..],
                None => break,
            }
            continue;
        }
        tags.push(Tag::Statement(body));
    }
    tags
}

fn trim_body(body: &str) -> &str {
    let body = body.strip_prefix('-').unwrap_or(body);
    let body = body.strip_suffix('-').unwrap_or(body);
    body.trim()
}

fn keyword_rest<'a>(body: &'a str, keyword: &str) -> Option<&'a str> {
    body.strip_prefix(keyword)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim)
}

fn collect_locals(body: &str, locals: &mut BTreeSet<String>) {
    if let Some(rest) = keyword_rest(body, "for") {
        if let Some((targets, _)) = rest.split_once(" in ") {
            locals.extend(targets.split(',').map(|t| t.trim().to_string()));
        }
    } else if let Some(rest) = keyword_rest(body, "set").or_else(|| keyword_rest(body, "set_global")) {
        if let Some((name, _)) = rest.split_once('=') {
            locals.insert(name.trim().to_string());
        }
    } else if let Some(rest) = keyword_rest(body, "macro") {
        let params = rest
            .split_once('(')
            .and_then(|(_, params)| params.rsplit_once(')'))
            .map(|(params, _)| params)
            .unwrap_or_default();
        for param in params.split(',') {
            let name = param.split('=').next().unwrap_or_default().trim();
            if !name.is_empty() {
                locals.insert(name.to_string());
            }
        }
    } else if let Some(rest) = keyword_rest(body, "import") {
        if let Some((_, alias)) = rest.rsplit_once(" as ") {
            locals.insert(alias.trim().to_string());
        }
    }
}

fn statement_expression(body: &str) -> Option<&str> {
    if let Some(rest) = keyword_rest(body, "if").or_else(|| keyword_rest(body, "elif")) {
        return Some(rest);
    }
    if let Some(rest) = keyword_rest(body, "for") {
        return rest.split_once(" in ").map(|(_, iterable)| iterable);
    }
    keyword_rest(body, "set")
        .or_else(|| keyword_rest(body, "set_global"))
        .and_then(|rest| rest.split_once('='))
        .map(|(_, value)| value)
}

#[derive(PartialEq)]
enum Prev {
    Start,
    Dot,
    Pipe,
    Path,
    Other,
}

fn scan_expression(expression: &str, found: &mut BTreeSet<String>) {
    let chars: Vec<char> = expression.chars().collect();
    let mut i = 0;
    let mut prev = Prev::Start;
    let mut after_is = false;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if matches!(c, '"' | '\'' | '`') {
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            prev = Prev::Other;
            continue;
        }
        if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            prev = Prev::Other;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let next = chars[i..].iter().copied().find(|c| !c.is_whitespace());
            let next_index = chars[i..]
                .iter()
                .position(|c| !c.is_whitespace())
                .map(|p| i + p);
            let next_next = next_index.and_then(|n| chars.get(n + 1)).copied();

            let is_test = after_is && word != "not";
            if word == "is" {
                after_is = true;
            } else if word != "not" {
                after_is = false;
            }

            let skip = matches!(prev, Prev::Dot | Prev::Pipe | Prev::Path)
                || is_test
                || KEYWORDS.contains(&word.as_str())
                || next == Some('(')
                || (next == Some(':') && next_next == Some(':'))
                || (next == Some('=') && next_next != Some('='));
            if !skip {
                found.insert(word);
            }
            prev = Prev::Other;
            continue;
        }

        prev = match c {
            '.' => Prev::Dot,
            '|' => Prev::Pipe,
            ':' if chars.get(i + 1) == Some(&':') => {
                i += 1;
                Prev::Path
            }
            _ => Prev::Other,
        };
        i += 1;
    }
}
