//! # Project Tree Printer
//!
//! File: cli/src/commands/blueprint/utils/tree_printer.rs
//!
//! ## Overview
//!
//! Draws a set of relative file paths as a tree, in the style of the `tree`
//! utility. `forge blueprint create` uses it to show what was generated and
//! `forge blueprint info` to show a blueprint's template layout.
//!
//! ## Architecture
//!
//! The flat path list is folded into a nested map first, so the output does
//! not depend on input order: directories come before files and each group
//! is alphabetical. Nothing touches the filesystem.
//!
//! Example output:
//!
//! ```text
//! my-api/
//! ├── cmd/
//! │   └── my-api/
//! │       └── main.go
//! ├── go.mod
//! └── README.md
//! ```
//!
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

/// Connector for intermediate items in a directory listing ("T" shape).
const TEE: &str = "├── ";
/// Connector for the last item in a directory listing ("L" shape).
const ELBOW: &str = "└── ";
/// Vertical line used for ongoing indentation levels.
const PIPE: &str = "│   ";
/// Spacer used for indentation levels after the last item has been printed.
const SPACER: &str = "    ";

#[derive(Default)]
struct Node<'a> {
    dirs: BTreeMap<&'a str, Node<'a>>,
    files: Vec<&'a str>,
}

impl<'a> Node<'a> {
    fn insert(&mut self, path: &'a str) {
        match path.split_once('/') {
            Some((dir, rest)) if !rest.is_empty() => {
                self.dirs.entry(dir).or_default().insert(rest);
            }
            _ => self.files.push(path.trim_end_matches('/')),
        }
    }
}

/// # Render Path Tree (`render_tree`)
///
/// Builds the tree for `paths` under a root labelled `root_label`.
///
/// ## Arguments
///
/// * `root_label` - Name shown on the first line (a trailing `/` is added).
/// * `paths` - Relative, `/`-separated file paths.
///
/// ## Returns
///
/// * `String` - The tree, one entry per line, ending with a newline.
pub fn render_tree<'a, I>(root_label: &str, paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = Node::default();
    for path in paths {
        root.insert(path);
    }

    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(output, "{}/", root_label);
    walk(&mut root, &mut String::new(), &mut output);
    output
}

fn walk(node: &mut Node<'_>, prefix: &mut String, output: &mut String) {
    node.files.sort_unstable();
    let total = node.dirs.len() + node.files.len();
    let mut index = 0;

    for (name, child) in node.dirs.iter_mut() {
        index += 1;
        let is_last = index == total;
        let _ = writeln!(output, "{}{}{}/", prefix, if is_last { ELBOW } else { TEE }, name);

        let component = if is_last { SPACER } else { PIPE };
        prefix.push_str(component);
        walk(child, prefix, output);
        prefix.truncate(prefix.len() - component.len());
    }

    for name in &node.files {
        index += 1;
        let connector = if index == total { ELBOW } else { TEE };
        let _ = writeln!(output, "{}{}{}", prefix, connector, name);
    }
}
