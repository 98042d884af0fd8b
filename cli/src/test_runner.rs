use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};
use serde::Deserialize;

use htm::MergePolicy;

use crate::context;

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Variables the template may reference.
    #[serde(default)]
    pub context: toml::Table,

    /// Rendering must fail with an error whose message contains this.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// The template text itself must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,

    #[serde(default)]
    pub call_site_wins: bool,
}

/// The fenced blocks a fixture body carries.
#[derive(Debug, Default, PartialEq)]
struct Blocks {
    template: Option<String>,
    expected: Option<String>,
}

/// Split a `.test.md` file into its TOML frontmatter and markdown body.
fn split_frontmatter(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;
    let frontmatter = after_open[..close].trim_end_matches('\r');
    let body = &after_open[close + 4..];

    let config: TestConfig =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

/// Collect the ```template and ```expected code blocks. Other blocks and
/// prose are documentation.
fn extract_blocks(body: &str) -> Blocks {
    let mut blocks = Blocks::default();
    let mut current: Option<(String, String)> = None;

    for event in pulldown_cmark::Parser::new(body) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let lang = info.split_whitespace().next().unwrap_or("").to_string();
                current = Some((lang, String::new()));
            }
            Event::Text(text) => {
                if let Some((_, content)) = current.as_mut() {
                    content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, content)) = current.take() {
                    // The fence always ends the last line.
                    let content = content.strip_suffix('\n').unwrap_or(&content).to_string();
                    match lang.as_str() {
                        "template" if blocks.template.is_none() => blocks.template = Some(content),
                        "expected" if blocks.expected.is_none() => blocks.expected = Some(content),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    blocks
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.md"))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    tracing::debug!(path = %path.display(), "running fixture");
    let (description, outcome) = match check_fixture(path) {
        Ok(description) => (description, TestOutcome::Pass),
        Err((description, reason)) => (description, TestOutcome::Fail(reason)),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

type Checked = Result<Option<String>, (Option<String>, String)>;

fn check_fixture(path: &Path) -> Checked {
    let content =
        std::fs::read_to_string(path).map_err(|e| (None, format!("cannot read file: {}", e)))?;
    let (config, body) =
        split_frontmatter(&content).map_err(|e| (None, format!("frontmatter error: {}", e)))?;
    let description = config.description.clone();
    let fail = |reason: String| -> Checked { Err((description.clone(), reason)) };

    let blocks = extract_blocks(body);
    let Some(source) = blocks.template else {
        return fail("no ```template block".into());
    };

    let vars = context::from_table(&config.context);
    let parsed = tagstr::parser::Parser::new(source, 0).parse(&vars);
    if config.expect_parse_error {
        return match parsed {
            Err(_) => Ok(description),
            Ok(_) => fail("expected parse error, but parsing succeeded".into()),
        };
    }
    let template = match parsed {
        Ok(template) => template,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(|e| e.message()).collect();
            return fail(format!("unexpected parse error: {}", messages.join("; ")));
        }
    };

    let merge_policy = if config.call_site_wins {
        MergePolicy::CallSiteWins
    } else {
        MergePolicy::NodeWins
    };
    let rendered = htm::html_template_with(&template, merge_policy).map(|node| node.to_string());

    match (&config.expect_error, &blocks.expected, rendered) {
        (Some(expected), _, Err(error)) => {
            let message = error.to_string();
            if message.contains(expected.as_str()) {
                Ok(description)
            } else {
                fail(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                ))
            }
        }
        (Some(expected), _, Ok(html)) => fail(format!(
            "expected error containing \"{}\", but rendered: {}",
            expected, html
        )),
        (None, _, Err(error)) => fail(format!("unexpected error: {}", error)),
        (None, None, Ok(_)) => fail("no ```expected block".into()),
        (None, Some(expected), Ok(html)) => {
            let (expected, actual) = (expected.trim(), html.trim());
            if expected == actual {
                Ok(description)
            } else {
                fail(format!(
                    "output mismatch\n  expected: {}\n  actual:   {}",
                    expected, actual
                ))
            }
        }
    }
}

/// Discover `.test.md` files grouped by subfolder relative to `root`.
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_name(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_name(category), files.len());
    }
}

/// ANSI styling for the report, or plain text with `--no-color`.
#[derive(Clone, Copy)]
struct Palette {
    no_color: bool,
}

impl Palette {
    fn paint(self, code: &str, s: &str) -> String {
        if self.no_color {
            s.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        }
    }

    fn pass(self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(self, s: &str) -> String {
        self.paint("1", s)
    }
}

fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let mut found = false;
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
                found = true;
            }
        }
        if !found {
            let available: Vec<&str> = all.keys().map(|k| category_name(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path` (or a single file), optionally
/// restricted to `categories`. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { no_color };

    // A single file is reported without a category header.
    let groups: Vec<(Option<String>, Vec<PathBuf>)> = if path.is_file() {
        vec![(None, vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(category, files)| (Some(category.to_string()), files.to_vec()))
            .collect()
    };

    report(palette, groups)
}

fn report(palette: Palette, groups: Vec<(Option<String>, Vec<PathBuf>)>) -> i32 {
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &groups {
        if let Some(category) = category {
            eprintln!();
            eprintln!("{}", palette.bold(category_name(category)));
        }
        for file in files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            palette.paint("32", "ok"),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "---\ndescription = \"greets\"\n[context]\nname = \"World\"\n---\nSome prose.\n\n```template\n<p>Hello {name}</p>\n```\n\n```expected\n<p>Hello World</p>\n```\n";

    #[test]
    fn frontmatter_and_body() {
        let (config, body) = split_frontmatter(FIXTURE).unwrap();
        assert_eq!(config.description.as_deref(), Some("greets"));
        assert_eq!(config.context.get("name").and_then(|v| v.as_str()), Some("World"));
        assert!(!config.expect_parse_error);
        assert!(body.contains("```template"));
    }

    #[test]
    fn missing_frontmatter() {
        assert!(split_frontmatter("no frontmatter").is_err());
        assert!(split_frontmatter("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn code_blocks() {
        let (_, body) = split_frontmatter(FIXTURE).unwrap();
        assert_eq!(
            extract_blocks(body),
            Blocks {
                template: Some("<p>Hello {name}</p>".into()),
                expected: Some("<p>Hello World</p>".into()),
            }
        );
    }

    #[test]
    fn other_blocks_are_ignored() {
        let blocks = extract_blocks("```rust\nfn main() {}\n```\n\n```template\n<br/>\n```\n");
        assert_eq!(blocks.template.as_deref(), Some("<br/>"));
        assert_eq!(blocks.expected, None);
    }

    #[test]
    fn category_selection() {
        let mut all = BTreeMap::new();
        all.insert("basics".to_string(), vec![PathBuf::from("a.test.md")]);
        all.insert("errors/tags".to_string(), vec![PathBuf::from("b.test.md")]);
        all.insert("errors/attrs".to_string(), vec![PathBuf::from("c.test.md")]);

        let selected = select_categories(&all, &["errors".to_string()]);
        assert_eq!(
            selected.keys().copied().collect::<Vec<_>>(),
            vec!["errors/attrs", "errors/tags"]
        );
        assert_eq!(select_categories(&all, &[]).len(), 3);
        assert!(select_categories(&all, &["nope".to_string()]).is_empty());
    }
}
