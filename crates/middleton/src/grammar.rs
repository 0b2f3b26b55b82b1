//! Fixed word and operator tables shared by the tokenizer and the parser.
//!
//! A [`Grammar`] is plain immutable data. The built-in configuration is
//! [`Grammar::MIDDLETON`]; callers that want a different dialect (mostly
//! tests) build their own value and hand it to
//! [`tokenize_with`](crate::tokenizer::tokenize_with) and
//! [`parse_with`](crate::parser::parse_with).

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Grammar {
    /// Words upgraded to [`TokenKind::Keyword`](crate::tokenizer::TokenKind::Keyword).
    pub reserved_words: &'static [&'static str],
    /// Words upgraded to [`TokenKind::Type`](crate::tokenizer::TokenKind::Type).
    /// Parameter types must come from this set.
    pub type_names: &'static [&'static str],
    /// Two-character operators. The scanner never merges these; every
    /// `other` character is its own token.
    pub operator_groups: &'static [&'static str],
    pub operator_precedence: &'static [(&'static str, u8)],
}

impl Grammar {
    pub const MIDDLETON: Grammar = Grammar {
        reserved_words: &["swyk", "notes", "if"],
        type_names: &["MFunc"],
        operator_groups: &["++", "--", "//", "==", "!=", "/=", "%=", "-=", "+=", "&&"],
        operator_precedence: &[
            ("=", 1),
            ("||", 2),
            ("&&", 3),
            ("<", 7),
            (">", 7),
            ("<=", 7),
            (">=", 7),
            ("==", 7),
            ("!=", 7),
            ("+", 10),
            ("-", 10),
            ("*", 20),
            ("/", 20),
            ("%", 20),
        ],
    };

    pub fn is_reserved_word(&self, word: &str) -> bool {
        self.reserved_words.contains(&word)
    }

    pub fn is_type_name(&self, word: &str) -> bool {
        self.type_names.contains(&word)
    }

    pub fn is_operator_group(&self, op: &str) -> bool {
        self.operator_groups.contains(&op)
    }

    /// Binding power of a binary operator, higher binds tighter.
    pub fn precedence(&self, op: &str) -> Option<u8> {
        self.operator_precedence
            .iter()
            .find(|(candidate, _)| *candidate == op)
            .map(|(_, power)| *power)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar::MIDDLETON
    }
}

#[cfg(test)]
mod tests {
    use super::Grammar;

    #[test]
    fn builtin_tables() {
        let grammar = Grammar::default();
        assert!(grammar.is_reserved_word("swyk"));
        assert!(grammar.is_reserved_word("notes"));
        assert!(!grammar.is_reserved_word("MFunc"));
        assert!(grammar.is_type_name("MFunc"));
        assert!(!grammar.is_type_name("mfunc"));
        assert!(grammar.is_operator_group("&&"));
        assert!(!grammar.is_operator_group("&"));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let grammar = Grammar::MIDDLETON;
        assert!(grammar.precedence("*") > grammar.precedence("+"));
        assert_eq!(grammar.precedence("=="), Some(7));
        assert_eq!(grammar.precedence("::"), None);
    }
}
