//! LanguageRegistry - keyword-driven multilingual front end for the
//! lexer.
//!
//! Grounded on `Languages/LanguageDefinition.h`/`.cpp`: a
//! `LanguageDefinition` is an immutable keyword -> `TokenId` map (plus
//! its reverse, for error messages and for `FunctionRegistry` alias
//! bookkeeping), and the registry picks a definition for a source
//! string by counting keyword occurrences and taking the highest
//! scorer, exiting early once any candidate passes a fixed threshold
//! (`Languages/LanguageDefinition.cpp`'s `DetectLanguage`).

use crate::token::TokenId;
use std::collections::BTreeMap;

/// A single language's keyword table.
#[derive(Clone)]
pub struct LanguageDefinition {
    pub locale_code: String,
    pub human_name: String,
    keywords: BTreeMap<String, TokenId>,
    reverse: BTreeMap<TokenId, String>,
}

impl LanguageDefinition {
    pub fn new(locale_code: impl Into<String>, human_name: impl Into<String>) -> Self {
        Self {
            locale_code: locale_code.into(),
            human_name: human_name.into(),
            keywords: BTreeMap::new(),
            reverse: BTreeMap::new(),
        }
    }

    pub fn with_keyword(mut self, word: &str, id: TokenId) -> Self {
        self.keywords.insert(word.to_string(), id);
        self.reverse.entry(id).or_insert_with(|| word.to_string());
        self
    }

    /// Case-insensitive keyword lookup; `None` means "not a keyword",
    /// i.e. the lexer should emit `TokenId::Ident` for this word.
    pub fn lookup(&self, word: &str) -> Option<TokenId> {
        self.keywords.get(&word.to_lowercase()).copied()
    }

    pub fn keyword_for(&self, id: TokenId) -> Option<&str> {
        self.reverse.get(&id).map(String::as_str)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }
}

/// Early-exit occurrence threshold for `detect_language`.
pub const DETECTION_EARLY_EXIT: usize = 3;

/// Holds every registered `LanguageDefinition`, keyed by locale code.
#[derive(Default)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, LanguageDefinition>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: LanguageDefinition) {
        self.languages
            .insert(definition.locale_code.clone(), definition);
    }

    pub fn get(&self, locale_code: &str) -> Option<&LanguageDefinition> {
        self.languages.get(locale_code)
    }

    /// Scans `source` for keyword occurrences of each registered
    /// language and returns the definition with the most hits,
    /// exiting as soon as a candidate reaches `DETECTION_EARLY_EXIT`
    /// occurrences. `//`-to-end-of-line comments are stripped first, so
    /// keywords mentioned only in a comment don't skew detection.
    pub fn detect_language(&self, source: &str) -> Option<&LanguageDefinition> {
        let stripped = strip_line_comments(source);
        let lower = stripped.to_lowercase();
        let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric() && c != '_').collect();

        let mut best: Option<(&LanguageDefinition, usize)> = None;
        for definition in self.languages.values() {
            let mut score = 0usize;
            for word in &words {
                if word.is_empty() {
                    continue;
                }
                if definition.lookup(word).is_some() {
                    score += 1;
                    if score >= DETECTION_EARLY_EXIT {
                        break;
                    }
                }
            }

            let better = match &best {
                Some((_, best_score)) => score > *best_score,
                None => true,
            };
            if better && score > 0 {
                best = Some((definition, score));
            }
            if score >= DETECTION_EARLY_EXIT {
                return Some(definition);
            }
        }

        best.map(|(definition, _)| definition)
    }
}

/// Removes every `//`-to-end-of-line span, matching `Lexer`'s own
/// comment handling, so detection never scores a keyword mentioned
/// only inside a comment.
fn strip_line_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn keywords() -> [(&'static str, TokenId); 21] {
    use TokenId::*;
    [
        ("entity", Entity),
        ("on", On),
        ("function", Function),
        ("if", If),
        ("else", Else),
        ("while", While),
        ("for", For),
        ("return", Return),
        ("break", Break),
        ("continue", Continue),
        ("var", Var),
        ("let", Let),
        ("global", Global),
        ("const", Const),
        ("trigger", Trigger),
        ("emit", Emit),
        ("event", Event),
        ("and", And),
        ("or", Or),
        ("not", Not),
        ("on", On),
    ]
}

fn english() -> LanguageDefinition {
    let mut def = LanguageDefinition::new("en", "English");
    for (word, id) in keywords() {
        def = def.with_keyword(word, id);
    }
    def
}

fn russian() -> LanguageDefinition {
    LanguageDefinition::new("ru", "Русский")
        .with_keyword("сущность", TokenId::Entity)
        .with_keyword("при", TokenId::On)
        .with_keyword("функция", TokenId::Function)
        .with_keyword("если", TokenId::If)
        .with_keyword("иначе", TokenId::Else)
        .with_keyword("пока", TokenId::While)
        .with_keyword("для", TokenId::For)
        .with_keyword("вернуть", TokenId::Return)
        .with_keyword("прервать", TokenId::Break)
        .with_keyword("продолжить", TokenId::Continue)
        .with_keyword("переменная", TokenId::Var)
        .with_keyword("пусть", TokenId::Let)
        .with_keyword("глобальная", TokenId::Global)
        .with_keyword("константа", TokenId::Const)
        .with_keyword("вызвать", TokenId::Trigger)
        .with_keyword("событие", TokenId::Event)
        .with_keyword("и", TokenId::And)
        .with_keyword("или", TokenId::Or)
        .with_keyword("не", TokenId::Not)
}

fn spanish() -> LanguageDefinition {
    LanguageDefinition::new("es", "Español")
        .with_keyword("entidad", TokenId::Entity)
        .with_keyword("al", TokenId::On)
        .with_keyword("funcion", TokenId::Function)
        .with_keyword("si", TokenId::If)
        .with_keyword("sino", TokenId::Else)
        .with_keyword("mientras", TokenId::While)
        .with_keyword("para", TokenId::For)
        .with_keyword("retornar", TokenId::Return)
        .with_keyword("romper", TokenId::Break)
        .with_keyword("continuar", TokenId::Continue)
        .with_keyword("variable", TokenId::Var)
        .with_keyword("global", TokenId::Global)
        .with_keyword("constante", TokenId::Const)
        .with_keyword("disparar", TokenId::Trigger)
        .with_keyword("evento", TokenId::Event)
        .with_keyword("y", TokenId::And)
        .with_keyword("o", TokenId::Or)
        .with_keyword("no", TokenId::Not)
}

fn french() -> LanguageDefinition {
    LanguageDefinition::new("fr", "Français")
        .with_keyword("entite", TokenId::Entity)
        .with_keyword("sur", TokenId::On)
        .with_keyword("fonction", TokenId::Function)
        .with_keyword("si", TokenId::If)
        .with_keyword("sinon", TokenId::Else)
        .with_keyword("tantque", TokenId::While)
        .with_keyword("pour", TokenId::For)
        .with_keyword("retourner", TokenId::Return)
        .with_keyword("arreter", TokenId::Break)
        .with_keyword("continuer", TokenId::Continue)
        .with_keyword("variable", TokenId::Var)
        .with_keyword("global", TokenId::Global)
        .with_keyword("constante", TokenId::Const)
        .with_keyword("declencher", TokenId::Trigger)
        .with_keyword("evenement", TokenId::Event)
        .with_keyword("et", TokenId::And)
        .with_keyword("ou", TokenId::Or)
        .with_keyword("non", TokenId::Not)
}

fn german() -> LanguageDefinition {
    LanguageDefinition::new("de", "Deutsch")
        .with_keyword("entitaet", TokenId::Entity)
        .with_keyword("bei", TokenId::On)
        .with_keyword("funktion", TokenId::Function)
        .with_keyword("wenn", TokenId::If)
        .with_keyword("sonst", TokenId::Else)
        .with_keyword("waehrend", TokenId::While)
        .with_keyword("fuer", TokenId::For)
        .with_keyword("zurueck", TokenId::Return)
        .with_keyword("abbrechen", TokenId::Break)
        .with_keyword("weiter", TokenId::Continue)
        .with_keyword("variable", TokenId::Var)
        .with_keyword("global", TokenId::Global)
        .with_keyword("konstante", TokenId::Const)
        .with_keyword("ausloesen", TokenId::Trigger)
        .with_keyword("ereignis", TokenId::Event)
        .with_keyword("und", TokenId::And)
        .with_keyword("oder", TokenId::Or)
        .with_keyword("nicht", TokenId::Not)
}

fn chinese() -> LanguageDefinition {
    LanguageDefinition::new("zh", "中文")
        .with_keyword("实体", TokenId::Entity)
        .with_keyword("当", TokenId::On)
        .with_keyword("函数", TokenId::Function)
        .with_keyword("如果", TokenId::If)
        .with_keyword("否则", TokenId::Else)
        .with_keyword("当满足", TokenId::While)
        .with_keyword("循环", TokenId::For)
        .with_keyword("返回", TokenId::Return)
        .with_keyword("跳出", TokenId::Break)
        .with_keyword("继续", TokenId::Continue)
        .with_keyword("变量", TokenId::Var)
        .with_keyword("全局", TokenId::Global)
        .with_keyword("常量", TokenId::Const)
        .with_keyword("触发", TokenId::Trigger)
        .with_keyword("事件", TokenId::Event)
        .with_keyword("且", TokenId::And)
        .with_keyword("或", TokenId::Or)
        .with_keyword("非", TokenId::Not)
}

/// Registers every built-in language definition. Idempotent in the
/// sense that calling it again just rebuilds the same table; callers
/// that want a process-wide singleton should cache the result (spec
/// §4.12 treats registration as "idempotent" at the call site).
pub fn register_builtin_languages(registry: &mut LanguageRegistry) {
    registry.register(english());
    registry.register(russian());
    registry.register(spanish());
    registry.register(french());
    registry.register(german());
    registry.register(chinese());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let def = english();
        assert_eq!(def.lookup("IF"), Some(TokenId::If));
        assert_eq!(def.lookup("If"), Some(TokenId::If));
        assert_eq!(def.lookup("banana"), None);
    }

    #[test]
    fn detects_russian_over_english_by_occurrence_count() {
        let mut registry = LanguageRegistry::new();
        register_builtin_languages(&mut registry);

        let source = "сущность Hero { если x { } пока y { } для z a b { } }";
        let detected = registry.detect_language(source).unwrap();
        assert_eq!(detected.locale_code, "ru");
    }

    #[test]
    fn detects_english_for_english_source() {
        let mut registry = LanguageRegistry::new();
        register_builtin_languages(&mut registry);

        let source = "entity Hero { if x { } while y { } for z a b { } }";
        let detected = registry.detect_language(source).unwrap();
        assert_eq!(detected.locale_code, "en");
    }

    #[test]
    fn comment_only_keywords_do_not_sway_detection() {
        let mut registry = LanguageRegistry::new();
        register_builtin_languages(&mut registry);

        let source = "// если если если\nentity Hero { if x { } }";
        let detected = registry.detect_language(source).unwrap();
        assert_eq!(detected.locale_code, "en");
    }
}
