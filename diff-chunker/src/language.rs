use crate::error::{ChunkerError, Result};
use std::path::Path;

/// Language detected from a file path, used to pick a tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Cpp,
    Java,
    JavaScript,
    TypeScript,
    Go,
    /// No grammar available; split by line windows instead.
    Text,
}

impl Language {
    /// Detect language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" => Language::Python,
            "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "java" => Language::Java,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            _ => Language::Text,
        }
    }

    /// Detect language from a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Text => "text",
        }
    }

    /// Whether a tree-sitter grammar is available for this language.
    pub fn supports_ast(self) -> bool {
        !matches!(self, Language::Text)
    }

    /// Get the tree-sitter grammar for this language.
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::Cpp => Ok(tree_sitter_cpp::LANGUAGE.into()),
            Language::Java => Ok(tree_sitter_java::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Go => Ok(tree_sitter_go::LANGUAGE.into()),
            Language::Text => Err(ChunkerError::unsupported_language(self.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_language_from_extension() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("PY"), Language::Python);
        assert_eq!(Language::from_extension("hpp"), Language::Cpp);
        assert_eq!(Language::from_extension("jsx"), Language::JavaScript);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("md"), Language::Text);
    }

    #[test]
    fn detects_language_from_path() {
        assert_eq!(Language::from_path("src/main.go"), Language::Go);
        assert_eq!(Language::from_path("Main.java"), Language::Java);
        assert_eq!(Language::from_path("Makefile"), Language::Text);
    }

    #[test]
    fn grammars_resolve_for_ast_languages() {
        for lang in [
            Language::Python,
            Language::Cpp,
            Language::Java,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
        ] {
            assert!(lang.supports_ast());
            assert!(lang.tree_sitter_language().is_ok());
        }
        assert!(Language::Text.tree_sitter_language().is_err());
    }
}
