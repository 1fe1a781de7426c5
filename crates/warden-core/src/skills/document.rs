// SPDX-License-Identifier: Apache-2.0

//! Skills that look at a whole document rather than single lines.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::PatternEngine;
use super::{Skill, SkillContext};
use crate::error::WardenError;
use crate::files::SourceFile;
use crate::finding::{Finding, Location, Severity, category_recommendation};

static POST_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*\bmethod\s*=\s*["'{]?\s*["']?post\b[^>]*>"#)
        .expect("valid form regex")
});

static CSRF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)csrf|xsrf|_token|authenticity_token").expect("valid token regex")
});

static DOCUMENT_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b|<html\b").expect("valid head regex"));

/// Bytes searched for a token before a form tag.
const TOKEN_WINDOW_BEFORE: usize = 100;
/// Bytes searched for a token after a form tag.
const TOKEN_WINDOW_AFTER: usize = 500;

fn has_extension(file: &SourceFile, allowed: &[&str]) -> bool {
    file.extension()
        .is_some_and(|ext| allowed.iter().any(|a| *a == ext))
}

/// 1-indexed line and column of a byte offset.
fn line_col(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Flags POST forms with no CSRF token near the form tag.
#[derive(Debug, Default)]
pub struct CsrfValidator;

impl CsrfValidator {
    fn scan(file: &SourceFile) -> Vec<Finding> {
        let content = &file.content;
        POST_FORM
            .find_iter(content)
            .filter(|form| {
                let start = floor_boundary(content, form.start().saturating_sub(TOKEN_WINDOW_BEFORE));
                let end = ceil_boundary(content, form.end() + TOKEN_WINDOW_AFTER);
                !CSRF_TOKEN.is_match(&content[start..end])
            })
            .map(|form| {
                let (line, column) = line_col(content, form.start());
                Finding::builder()
                    .category("csrf")
                    .severity(Severity::Critical)
                    .location(Location {
                        path: file.path.clone(),
                        line,
                        column: Some(column),
                    })
                    .snippet(form.as_str().lines().next().unwrap_or_default().trim())
                    .description("POST form without CSRF token")
                    .recommendation(category_recommendation("csrf"))
                    .standard_identifier("CWE-352")
                    .build()
            })
            .collect()
    }
}

impl Skill for CsrfValidator {
    fn name(&self) -> &str {
        "csrfValidator"
    }

    fn description(&self) -> &str {
        "Detects POST forms that carry no CSRF token"
    }

    fn category(&self) -> &str {
        "csrf"
    }

    fn run(&self, ctx: &SkillContext) -> Result<Vec<Finding>, WardenError> {
        let mut findings = Vec::new();
        for file in ctx.files().files() {
            ctx.checkpoint()?;
            if has_extension(file, &[".html", ".htm", ".jsx", ".tsx"]) {
                findings.extend(Self::scan(file));
            }
        }
        Ok(findings)
    }
}

/// Flags HTML documents without a Content Security Policy.
#[derive(Debug, Default)]
pub struct CspValidator;

impl CspValidator {
    fn scan(file: &SourceFile) -> Option<Finding> {
        let head = DOCUMENT_HEAD.find(&file.content)?;
        if file
            .content
            .to_ascii_lowercase()
            .contains("content-security-policy")
        {
            return None;
        }

        let (line, column) = line_col(&file.content, head.start());
        Some(
            Finding::builder()
                .category("csp")
                .severity(Severity::Medium)
                .location(Location {
                    path: file.path.clone(),
                    line,
                    column: Some(column),
                })
                .snippet(head.as_str())
                .description("Missing Content Security Policy")
                .recommendation(category_recommendation("csp"))
                .standard_identifier("CWE-1021")
                .build(),
        )
    }
}

impl Skill for CspValidator {
    fn name(&self) -> &str {
        "cspValidator"
    }

    fn description(&self) -> &str {
        "Detects HTML documents served without a Content-Security-Policy"
    }

    fn category(&self) -> &str {
        "csp"
    }

    fn run(&self, ctx: &SkillContext) -> Result<Vec<Finding>, WardenError> {
        let mut findings = Vec::new();
        for file in ctx.files().files() {
            ctx.checkpoint()?;
            if has_extension(file, &[".html", ".htm"]) {
                findings.extend(Self::scan(file));
            }
        }
        Ok(findings)
    }
}

/// TypeScript and React conventions: signature checks plus component file naming.
#[derive(Debug, Default)]
pub struct ReactStandards;

impl ReactStandards {
    const NAME: &'static str = "reactStandards";

    fn check_file_name(file: &SourceFile) -> Option<Finding> {
        if !has_extension(file, &[".jsx", ".tsx"]) {
            return None;
        }
        let name = file.file_name();
        let stem = name.split('.').next().unwrap_or(name);
        let is_support_file = [".test.", ".spec.", ".stories."]
            .iter()
            .any(|marker| name.contains(marker));
        let starts_lower = stem.chars().next().is_some_and(char::is_lowercase);
        if !starts_lower || stem == "index" || is_support_file {
            return None;
        }

        Some(
            Finding::builder()
                .category("standards")
                .severity(Severity::Low)
                .location(Location::new(file.path.clone(), 1))
                .snippet(format!("File: {name}"))
                .description("Component file name is not PascalCase")
                .recommendation(category_recommendation("standards"))
                .auto_fixable(true)
                .build(),
        )
    }
}

impl Skill for ReactStandards {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Checks TypeScript and React coding standards"
    }

    fn category(&self) -> &str {
        "standards"
    }

    fn run(&self, ctx: &SkillContext) -> Result<Vec<Finding>, WardenError> {
        let engine = PatternEngine::global();
        let mut findings = Vec::new();
        for file in ctx.files().files() {
            ctx.checkpoint()?;
            findings.extend(Self::check_file_name(file));
            findings.extend(engine.scan(Self::NAME, file));
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::FileSet;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn run(skill: &dyn Skill, sources: &[(&str, &str)]) -> Vec<Finding> {
        let files = Arc::new(FileSet::from_sources(sources.iter().copied()));
        skill
            .run(&SkillContext::new(files, CancellationToken::new()))
            .unwrap()
    }

    #[test]
    fn test_csrf_missing_token() {
        let html = "<html>\n<body>\n<form action=\"/pay\" method=\"POST\">\n<input name=\"amount\">\n</form>\n</body>\n</html>\n";
        let findings = run(&CsrfValidator, &[("pay.html", html)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].location.line, 3);
        assert_eq!(findings[0].standard_identifier.as_deref(), Some("CWE-352"));
    }

    #[test]
    fn test_csrf_token_present() {
        let html = "<form method='post'>\n<input type='hidden' name='csrf_token' value='{{t}}'>\n</form>";
        assert!(run(&CsrfValidator, &[("pay.html", html)]).is_empty());

        let get_form = "<form method=\"get\" action=\"/search\"></form>";
        assert!(run(&CsrfValidator, &[("s.html", get_form)]).is_empty());
    }

    #[test]
    fn test_csp_missing_and_present() {
        let bare = "<!doctype html>\n<html>\n<head><title>x</title></head>\n</html>";
        let findings = run(&CspValidator, &[("index.html", bare)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 2);
        assert_eq!(findings[0].category, "csp");

        let with_csp = "<html><head><meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'self'\"></head></html>";
        assert!(run(&CspValidator, &[("index.html", with_csp)]).is_empty());

        let fragment = "<div>partial</div>";
        assert!(run(&CspValidator, &[("part.html", fragment)]).is_empty());
    }

    #[test]
    fn test_react_file_naming() {
        let findings = run(
            &ReactStandards,
            &[
                ("src/components/cardList.tsx", "export const CardList = () => null;"),
                ("src/components/CardGrid.tsx", "export const CardGrid = () => null;"),
                ("src/index.tsx", "render();"),
                ("src/cardList.test.tsx", "test('x', () => {});"),
            ],
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].auto_fixable);
        assert_eq!(findings[0].location.path, "src/components/cardList.tsx");
    }

    #[test]
    fn test_react_signatures() {
        let code = "class Old extends React.Component {}\nfunction f(x: any) {}\n";
        let findings = run(&ReactStandards, &[("src/Old.tsx", code)]);
        let lines: Vec<_> = findings.iter().map(|f| f.location.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("ab\ncd", 4), (2, 2));
        assert_eq!(line_col("é\nx", 3), (2, 1));
    }
}
