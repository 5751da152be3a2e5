//! Turns candidate code, an optional adapter and one test case into a single
//! self-contained program.
//!
//! The test input is fed on stdin. The program calls the entry point (the
//! adapter's invocation expression, or a `solve` convention per language),
//! then prints the returned value in canonical form: strings raw, numbers and
//! booleans as-is, `null` for nothing, composite values as compact JSON.
//!
//! Import lines of the harness, the candidate and the adapter are merged with
//! first-occurrence-wins deduplication. This is a line-level match: only
//! simple single-line imports (plus Go `import ( ... )` blocks) are
//! recognized, nothing is parsed.

mod template;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{Adapter, Language, TestCase};

/// A runnable program plus the stdin it should be fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harness {
    pub language: Language,
    /// File name the toolchain expects for `source`.
    pub file_name: &'static str,
    pub source: String,
    pub stdin: String,
}

static PYTHON_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(import\s+\S|from\s+\S+\s+import\s)").unwrap());
static SCRIPT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(import\s.*['"][^'"]+['"]\s*;?\s*$|(const|let|var)\s+.+=\s*require\(\s*['"][^'"]+['"]\s*\)\s*;?\s*$)"#)
        .unwrap()
});
static JAVA_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^import\s+(static\s+)?[\w.]+(\.\*)?\s*;\s*$").unwrap());
static JAVA_PUBLIC_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^public\s+((final|abstract|sealed)\s+)*(class|interface|enum|record)\b").unwrap()
});
static CPP_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(#\s*include\s*[<"]|using\s+namespace\s+[\w:]+\s*;\s*$)"#).unwrap()
});
static GO_SINGLE_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^import\s+((\w+|\.|_)\s+)?"[^"]+"\s*$"#).unwrap());
static SOLUTION_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(export\s+)?(class|struct)\s+Solution\b").unwrap());
static TOP_LEVEL_SOLVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(def\s+solve\b|(export\s+)?(async\s+)?function\s+solve\b|(export\s+)?(const|let|var)\s+solve\b)")
        .unwrap()
});

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@@([A-Z]+)@@").unwrap());

/// Source split into its recognized import lines and everything else.
#[derive(Debug, Default)]
struct SplitSource {
    imports: Vec<String>,
    body: String,
}

fn split_imports(language: Language, source: &str) -> SplitSource {
    let mut split = SplitSource::default();
    let mut body = Vec::new();
    let mut in_go_block = false;

    for line in source.lines() {
        let trimmed = line.trim();
        match language {
            Language::Go => {
                if in_go_block {
                    if trimmed == ")" {
                        in_go_block = false;
                    } else if !trimmed.is_empty() && !trimmed.starts_with("//") {
                        split.imports.push(trimmed.to_owned());
                    }
                    continue;
                }
                if trimmed.starts_with("package ") {
                    continue;
                }
                if trimmed == "import (" {
                    in_go_block = true;
                    continue;
                }
                if GO_SINGLE_IMPORT.is_match(trimmed) {
                    let spec = trimmed.trim_start_matches("import").trim();
                    split.imports.push(spec.to_owned());
                    continue;
                }
            }
            // Python imports inside functions stay where they are.
            Language::Python if PYTHON_IMPORT.is_match(line) => {
                split.imports.push(trimmed.to_owned());
                continue;
            }
            Language::JavaScript | Language::TypeScript if SCRIPT_IMPORT.is_match(trimmed) => {
                split.imports.push(trimmed.to_owned());
                continue;
            }
            Language::Java if JAVA_IMPORT.is_match(trimmed) => {
                split.imports.push(trimmed.to_owned());
                continue;
            }
            Language::Java if trimmed.starts_with("package ") => continue,
            Language::Cpp if CPP_IMPORT.is_match(trimmed) => {
                split.imports.push(trimmed.to_owned());
                continue;
            }
            _ => {}
        }
        body.push(line);
    }

    split.body = body.join("\n");
    if language == Language::Java {
        split.body = demote_public_types(&split.body);
    }
    split
}

/// Only `Main` may be public inside `Main.java`.
fn demote_public_types(body: &str) -> String {
    body.lines()
        .map(|line| {
            if JAVA_PUBLIC_TYPE.is_match(line) {
                line.trim_start_matches("public").trim_start()
            } else {
                line
            }
        })
        .join("\n")
}

/// Whether the non-blank lines of `needle`, trimmed, appear as a contiguous
/// run of whole lines in `haystack`.
fn contains_lines(haystack: &str, needle: &str) -> bool {
    fn significant(s: &str) -> Vec<&str> {
        s.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }
    let needle = significant(needle);
    !needle.is_empty()
        && significant(haystack)
            .windows(needle.len())
            .any(|run| run == needle.as_slice())
}

/// Merge import lists, first occurrence wins.
fn merge_imports<'a>(lists: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    lists
        .into_iter()
        .flat_map(|l| l.iter())
        .map(|l| l.trim().to_owned())
        .filter(|l| !l.is_empty())
        .unique()
        .collect()
}

fn harness_imports(language: Language) -> Vec<String> {
    let own: &[&str] = match language {
        Language::Cpp => template::CPP_INCLUDES,
        Language::Go => template::GO_IMPORTS,
        _ => &[],
    };
    own.iter().map(|s| s.to_string()).collect()
}

fn file_name(language: Language) -> &'static str {
    match language {
        Language::Python => "main.py",
        Language::JavaScript => "main.js",
        Language::TypeScript => "main.ts",
        Language::Java => "Main.java",
        Language::Cpp => "main.cpp",
        Language::Go => "main.go",
    }
}

/// Choose the default call for code that brings no adapter entry.
fn default_entry(language: Language, code: &str) -> &'static str {
    let class_style = SOLUTION_CLASS.is_match(code) && !TOP_LEVEL_SOLVE.is_match(code);
    match (language, class_style) {
        (Language::Python, false) => template::PYTHON_ENTRY,
        (Language::Python, true) => template::PYTHON_CLASS_ENTRY,
        (Language::JavaScript, false) => template::JAVASCRIPT_ENTRY,
        (Language::JavaScript, true) => template::JAVASCRIPT_CLASS_ENTRY,
        (Language::TypeScript, false) => template::TYPESCRIPT_ENTRY,
        (Language::TypeScript, true) => template::TYPESCRIPT_CLASS_ENTRY,
        (Language::Java, _) => template::JAVA_ENTRY,
        (Language::Cpp, false) => template::CPP_ENTRY,
        (Language::Cpp, true) => template::CPP_CLASS_ENTRY,
        (Language::Go, _) => template::GO_ENTRY,
    }
}

/// Build the program for one test case.
pub fn build_harness(
    language: Language,
    code: &str,
    case: &TestCase,
    adapter: Option<&Adapter>,
) -> Harness {
    let candidate = split_imports(language, code);
    let adapter_code = adapter.and_then(|a| a.code.as_deref()).unwrap_or("");
    let adapter_split = split_imports(language, adapter_code);

    // Adapter code the candidate already carries line for line is not repeated.
    let adapter_body = {
        let body = adapter_split.body.trim();
        if body.is_empty() || contains_lines(&candidate.body, body) {
            ""
        } else {
            body
        }
    };

    let imports = merge_imports([
        harness_imports(language).as_slice(),
        candidate.imports.as_slice(),
        adapter_split.imports.as_slice(),
    ]);
    let imports = match language {
        Language::Go => imports.iter().map(|spec| format!("\t{}", spec)).join("\n"),
        _ => imports.join("\n"),
    };

    let adapter_entry = adapter
        .and_then(|a| a.entry.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let entry = adapter_entry.unwrap_or_else(|| {
        default_entry(language, &format!("{}\n{}", candidate.body, adapter_body))
    });
    let invoker = match adapter_entry {
        Some(_) => "",
        None => template::JAVA_INVOKER,
    };

    let skeleton = match language {
        Language::Python => template::PYTHON.to_owned(),
        Language::JavaScript => template::javascript(),
        Language::TypeScript => template::typescript(),
        Language::Java => template::JAVA.to_owned(),
        Language::Cpp => template::CPP.to_owned(),
        Language::Go => template::GO.to_owned(),
    };

    // One pass over the skeleton only: placeholders inside substituted text
    // are left alone.
    let source = PLACEHOLDER
        .replace_all(&skeleton, |caps: &Captures| {
            let text = match &caps[1] {
                "IMPORTS" => imports.as_str(),
                "CANDIDATE" => candidate.body.trim_end(),
                "ADAPTER" => adapter_body,
                "ENTRY" => entry,
                "INVOKER" => invoker,
                _ => "",
            };
            text.to_owned()
        })
        .into_owned();

    Harness {
        language,
        file_name: file_name(language),
        source,
        stdin: case.input.clone(),
    }
}
