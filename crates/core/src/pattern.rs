//! Glob Pattern Matching Module
//!
//! Provides glob matching for the KEYS command. `*` matches any sequence
//! of bytes (including empty); every other byte matches literally, so
//! regex metacharacters in a pattern have no special meaning. An empty
//! pattern is treated as `*`.

/// A compiled glob pattern for efficient matching
#[derive(Debug, Clone)]
pub struct Pattern {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone)]
enum Token {
    /// Match any sequence of bytes (including empty)
    Star,
    /// Match a literal byte
    Literal(u8),
}

impl Pattern {
    /// Compile a glob pattern
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            tokens: Self::compile(pattern),
        }
    }

    /// Compile pattern into tokens
    fn compile(pattern: &[u8]) -> Vec<Token> {
        if pattern.is_empty() {
            return vec![Token::Star];
        }

        let mut tokens = Vec::new();
        for &byte in pattern {
            match byte {
                b'*' => {
                    // Collapse consecutive stars into one
                    if !matches!(tokens.last(), Some(Token::Star)) {
                        tokens.push(Token::Star);
                    }
                }
                c => tokens.push(Token::Literal(c)),
            }
        }

        tokens
    }

    /// Check if a key matches this pattern
    pub fn matches(&self, key: &[u8]) -> bool {
        Self::match_tokens(&self.tokens, key)
    }

    /// Iterative matching with backtracking for star wildcards
    fn match_tokens(tokens: &[Token], input: &[u8]) -> bool {
        let mut ti = 0; // token index
        let mut ii = 0; // input index

        // For backtracking on star matches
        let mut star_ti: Option<usize> = None;
        let mut star_ii: Option<usize> = None;

        while ii < input.len() || ti < tokens.len() {
            if ti < tokens.len() {
                match &tokens[ti] {
                    Token::Star => {
                        // Record position for backtracking
                        star_ti = Some(ti);
                        star_ii = Some(ii);
                        ti += 1;
                        continue;
                    }
                    Token::Literal(c) if ii < input.len() && input[ii] == *c => {
                        ti += 1;
                        ii += 1;
                        continue;
                    }
                    _ => {}
                }
            }

            // No match - try backtracking
            if let (Some(sti), Some(sii)) = (star_ti, star_ii) {
                // Consume one more byte with the star
                ti = sti + 1;
                ii = sii + 1;
                star_ii = Some(sii + 1);

                if ii <= input.len() {
                    continue;
                }
            }

            // No match and no backtrack available
            return false;
        }

        true
    }

    /// Check if the pattern matches everything (is just "*")
    pub fn matches_all(&self) -> bool {
        self.tokens.len() == 1 && matches!(self.tokens[0], Token::Star)
    }
}
