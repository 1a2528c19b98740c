//! ScriptCompiler - file-to-AST front end.
//!
//! Grounded on `Core/ScriptCompiler.cpp`: lazily registers the builtin
//! languages and functions once, then resolves the file's language
//! either from a compound extension (`script.ru.logcon` -> `ru`) or by
//! scanning the source content, lexes, and parses, retaining the AST
//! on success.

use std::fs;
use std::path::Path;

use crate::ast::Script;
use crate::builtins::register_builtin_functions;
use crate::function_registry::FunctionRegistry;
use crate::language::{register_builtin_languages, LanguageRegistry};
use crate::lexer::Lexer;
use crate::parser::{ParseError, Parser};
use crate::token::TokenId;

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("failed to read script file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("script file {0} is empty")]
    Empty(String),
    #[error("could not detect a language for {0}")]
    UnknownLanguage(String),
    #[error("lex error: invalid token at line {line}, column {column}")]
    Lex { line: u32, column: u32 },
    #[error("{count} parse error(s)")]
    Parse { count: usize, errors: Vec<ParseError> },
}

/// Compiles `.logcon` source files into an AST `Script`, owning the
/// language and function registries a host needs to then build an
/// `Interpreter`, ensuring built-in languages and functions are
/// registered before anything gets compiled.
pub struct ScriptCompiler {
    languages: LanguageRegistry,
    functions: FunctionRegistry,
}

impl ScriptCompiler {
    pub fn new() -> Self {
        let mut languages = LanguageRegistry::new();
        register_builtin_languages(&mut languages);
        let mut functions = FunctionRegistry::new();
        register_builtin_functions(&mut functions);
        Self { languages, functions }
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Hands ownership of the function registry to a caller building
    /// an `Interpreter`; replaces it with a freshly-registered one so
    /// this compiler stays usable.
    pub fn take_functions(&mut self) -> FunctionRegistry {
        let mut replacement = FunctionRegistry::new();
        register_builtin_functions(&mut replacement);
        core::mem::replace(&mut self.functions, replacement)
    }

    /// Compiles the `.logcon` file at `path` into a `Script` AST:
    /// reads the file, detects its language, lexes, then parses.
    pub fn compile_script(&self, path: impl AsRef<Path>) -> Result<Script, CompileError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.display().to_string(),
            source,
        })?;

        if source.trim().is_empty() {
            log::error!("script file {} is empty", path.display());
            return Err(CompileError::Empty(path.display().to_string()));
        }

        let language = self
            .detect_language(path, &source)
            .ok_or_else(|| CompileError::UnknownLanguage(path.display().to_string()))?;

        let tokens = Lexer::new(language, &source).tokenize();
        if let Some(bad) = tokens.iter().find(|t| t.id == TokenId::Invalid) {
            log::error!("invalid token at line {}, column {}", bad.line, bad.column);
            return Err(CompileError::Lex { line: bad.line, column: bad.column });
        }
        match tokens.last() {
            Some(last) if last.id == TokenId::EndOfFile => {}
            _ => {
                log::error!("token stream for {} does not end with end-of-file", path.display());
                return Err(CompileError::Lex { line: 0, column: 0 });
            }
        }

        let result = Parser::new(tokens).parse();
        if !result.succeeded() {
            for error in &result.errors {
                log::error!("{error}");
            }
            return Err(CompileError::Parse { count: result.errors.len(), errors: result.errors });
        }

        Ok(result.script)
    }

    /// Locale from a compound extension (`script.ru.logcon` -> `ru`),
    /// falling back to content-based detection.
    fn detect_language(&self, path: &Path, source: &str) -> Option<&crate::language::LanguageDefinition> {
        if let Some(locale) = compound_extension_locale(path) {
            if let Some(definition) = self.languages.get(&locale) {
                return Some(definition);
            }
        }
        self.languages.detect_language(source)
    }
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the locale code from a `name.<locale>.logcon` style path.
fn compound_extension_locale(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let mut parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() < 3 {
        return None;
    }
    // drop the trailing "logcon" extension, keep the locale segment
    // just before it.
    parts.pop();
    parts.pop().map(|s| s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("logcon_compiler_test_{name}_{:p}", name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn compound_extension_extracts_locale() {
        let path = Path::new("script.ru.logcon");
        assert_eq!(compound_extension_locale(path), Some("ru".to_string()));
    }

    #[test]
    fn plain_extension_has_no_locale() {
        let path = Path::new("script.logcon");
        assert_eq!(compound_extension_locale(path), None);
    }

    #[test]
    fn empty_file_fails_to_compile() {
        let path = write_temp("empty", "   \n");
        let compiler = ScriptCompiler::new();
        let result = compiler.compile_script(&path);
        assert!(matches!(result, Err(CompileError::Empty(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_fails_to_compile() {
        let compiler = ScriptCompiler::new();
        let result = compiler.compile_script("/nonexistent/path/does_not_exist.logcon");
        assert!(matches!(result, Err(CompileError::Io { .. })));
    }

    #[test]
    fn valid_english_script_compiles() {
        let source = "entity Hero {\n    on create {\n        health = 100\n    }\n}\n";
        let path = write_temp("valid", source);
        let compiler = ScriptCompiler::new();
        let script = compiler.compile_script(&path).expect("should compile");
        assert_eq!(script.entities.len(), 1);
        assert_eq!(script.entities[0].name, "Hero");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unterminated_string_fails_as_lex_error() {
        let source = "entity Hero {\n    on create {\n        name = \"unterminated\n    }\n}\n";
        let path = write_temp("lexfail", source);
        let compiler = ScriptCompiler::new();
        let result = compiler.compile_script(&path);
        assert!(matches!(result, Err(CompileError::Lex { .. })));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_script_reports_parse_errors() {
        let source = "entity Hero {\n    on create {\n        = = =\n    }\n}\n";
        let path = write_temp("parsefail", source);
        let compiler = ScriptCompiler::new();
        let result = compiler.compile_script(&path);
        assert!(matches!(result, Err(CompileError::Parse { .. })));
        let _ = fs::remove_file(path);
    }
}
