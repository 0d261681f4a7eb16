use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Source directories covered by the policy scan. Anything else in the checkout (vendored
// data, scratch files) is ignored.
const SCANNED_DIRS: [&str; 4] = ["engine", "cli", "tests", "benches"];

const FORBIDDEN_WORDS: [&str; 14] = [
    "FIXED",
    "CORRECTED",
    "FIX",
    "FIXES",
    "NEW",
    "CHANGED",
    "CHANGES",
    "CHANGE",
    "MODIFIED",
    "MODIFIES",
    "MODIFY",
    "UPDATED",
    "UPDATES",
    "UPDATE",
];

/// One rule of the source policy: a line regex plus a filter deciding whether a matched
/// line really violates the rule.
struct Rule {
    name: &'static str,
    pattern: String,
    include_build_script: bool,
    accept: fn(&str) -> bool,
    advice: &'static str,
}

// Collects the violating lines of a single file.
struct ViolationCollector {
    accept: fn(&str) -> bool,
    violations: Vec<String>,
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if (self.accept)(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SCANNED_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let rules = [
        Rule {
            name: "underscore-prefixed identifiers",
            pattern: r"\b(_[a-zA-Z0-9_]+)\b".to_string(),
            include_build_script: true,
            accept: is_code_identifier,
            advice: "Use the binding (dropping the underscore) or remove it.",
        },
        Rule {
            name: "change-log words in comments",
            pattern: format!(r"(//|/\*).*(?:{})", FORBIDDEN_WORDS.join("|")),
            include_build_script: false,
            accept: |_| true,
            advice: "Comments describe the code as it is; remove edit-history markers.",
        },
        Rule {
            name: "'**' in non-doc comments",
            pattern: r"(//|/\*).*\*\*".to_string(),
            include_build_script: false,
            accept: |line| !is_doc_comment(line),
            advice: "Markdown emphasis belongs in doc comments only.",
        },
        Rule {
            name: "all-uppercase comments",
            pattern: r"(//|/\*).*".to_string(),
            include_build_script: false,
            accept: is_shouting_comment,
            advice: "Write comments in sentence case or delete them.",
        },
        Rule {
            name: "#[allow(dead_code)] attributes",
            pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]".to_string(),
            include_build_script: false,
            accept: |_| true,
            advice: "Use the item or remove it.",
        },
    ];

    for rule in &rules {
        if let Err(e) = enforce(rule) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn rust_sources(include_build_script: bool) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = SCANNED_DIRS
        .iter()
        .filter(|dir| Path::new(dir).is_dir())
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect();
    if include_build_script {
        sources.push(PathBuf::from("build.rs"));
    }
    sources
}

fn enforce(rule: &Rule) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(&rule.pattern)?;
    let mut searcher = Searcher::new();

    for path in rust_sources(rule.include_build_script) {
        let mut collector = ViolationCollector {
            accept: rule.accept,
            violations: Vec::new(),
        };
        searcher.search_path(&matcher, &path, &mut collector)?;

        if !collector.violations.is_empty() {
            let mut message = format!(
                "\n❌ ERROR: Found {} {} in {}:\n",
                collector.violations.len(),
                rule.name,
                path.display()
            );
            for violation in &collector.violations {
                message.push_str(&format!("   {violation}\n"));
            }
            message.push_str(&format!("\n⚠️ {}\n", rule.advice));
            return Err(message.into());
        }
    }
    Ok(())
}

fn is_doc_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

// A match counts only when it sits in code: not in a comment line and not between quotes.
fn is_code_identifier(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") || trimmed.starts_with("/*") {
        return false;
    }
    let quoted = line
        .split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'));
    !quoted
}

fn is_shouting_comment(line: &str) -> bool {
    let Some(start) = line.find("//").or_else(|| line.find("/*")) else {
        return false;
    };
    let comment = line[start..].trim_start_matches(['/', '*', '!']);
    let letters: Vec<char> = comment.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
}
