//! Rewrite rules applied to the compiled driver before it runs.
//!
//! The output is static markup from trusted sources, so the virtual DOM's
//! sanitizing guards are replaced with identity functions. The original
//! definitions stay in place under a `_DISABLED_` name.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::driver::SERIALIZE_PLACEHOLDER;
use crate::CodegenError;

/// Guard functions and the name of their first parameter.
const GUARDS: &[(&str, &str)] = &[
    ("_VirtualDom_noScript", "tag"),
    ("_VirtualDom_noOnOrFormAction", "key"),
    ("_VirtualDom_noInnerHtmlOrFormAction", "key"),
    ("_VirtualDom_noJavaScriptUri", "value"),
    ("_VirtualDom_noJavaScriptOrHtmlUri", "value"),
];

/// A single textual substitution over the compiled artifact.
#[derive(Debug)]
pub struct RewriteRule {
    /// Identifier used in logs
    pub name: &'static str,

    pattern: Regex,
    replacement: String,

    /// Text present once the rule has fired
    applied_marker: Option<String>,
}

impl RewriteRule {
    /// Build a rule matching `pattern` literally.
    pub fn literal(
        name: &'static str,
        pattern: &str,
        replacement: impl Into<String>,
        applied_marker: Option<String>,
    ) -> Self {
        Self {
            name,
            pattern: Regex::new(&regex::escape(pattern)).expect("Escaped pattern is valid"),
            replacement: replacement.into(),
            applied_marker,
        }
    }

    /// Whether `source` already carries this rule's rewrite.
    pub fn is_applied(&self, source: &str) -> bool {
        self.applied_marker
            .as_deref()
            .is_some_and(|marker| source.contains(marker))
    }

    /// Apply the rule, borrowing `source` back when nothing changes.
    pub fn apply<'a>(&self, source: &'a str) -> Cow<'a, str> {
        if self.is_applied(source) {
            return Cow::Borrowed(source);
        }

        self.pattern
            .replace_all(source, NoExpand(self.replacement.as_str()))
    }
}

/// Turn a guard into an identity function on its first parameter.
fn disable_guard(name: &'static str, param: &str) -> RewriteRule {
    let disabled = format!("_DISABLED{}", name);

    RewriteRule::literal(
        name,
        &format!("function {}(", name),
        format!(
            "function {name}({param}) {{ return {param} }}\nfunction {disabled}(",
            name = name,
            param = param,
            disabled = disabled,
        ),
        Some(format!("function {}(", disabled)),
    )
}

/// The full rule table, in application order.
pub fn rules() -> &'static [RewriteRule] {
    static RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
        let mut rules = vec![RewriteRule {
            name: "json_stringify",
            pattern: Regex::new(&format!(
                r#"'{0}'|"{0}""#,
                regex::escape(SERIALIZE_PLACEHOLDER)
            ))
            .expect("Invalid placeholder regex"),
            replacement: "JSON.stringify(x)".to_string(),
            applied_marker: None,
        }];

        rules.extend(GUARDS.iter().map(|(name, param)| disable_guard(name, param)));
        rules
    });

    &RULES
}

/// Result of patching an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// Rewritten source
    pub source: String,

    /// Rules that changed something
    pub applied: Vec<&'static str>,
}

/// Apply every rule to `source`. Rules whose pattern is absent do nothing.
pub fn patch(source: &str) -> Patched {
    let mut current = source.to_string();
    let mut applied = Vec::new();

    for rule in rules() {
        let rewritten = match rule.apply(&current) {
            Cow::Owned(rewritten) => rewritten,
            Cow::Borrowed(_) => continue,
        };
        applied.push(rule.name);
        current = rewritten;
    }

    Patched {
        source: current,
        applied,
    }
}

/// Patch the compiled artifact at `path` in place.
pub fn patch_file(path: &Path) -> Result<Vec<&'static str>, CodegenError> {
    let source = fs::read_to_string(path).map_err(|e| CodegenError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let patched = patch(&source);

    for name in &patched.applied {
        tracing::debug!("Applied rewrite {} to {}", name, path.display());
    }
    for rule in rules() {
        if !patched.applied.contains(&rule.name) && !rule.is_applied(&patched.source) {
            tracing::debug!("Rewrite {} found nothing to replace", rule.name);
        }
    }

    fs::write(path, patched.source).map_err(|e| CodegenError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(patched.applied)
}
