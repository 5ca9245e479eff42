//! Splitting SQL scripts into statements and stripping comments.

/// Character cursor over a script, aware of quotes and comments.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    const fn at_line_start(&self) -> bool {
        self.pos == 0 || self.input.as_bytes()[self.pos - 1] == b'\n'
    }

    /// Skips a quoted run. A doubled quote inside is an escaped quote.
    fn skip_quoted(&mut self, quote: char) {
        self.advance();
        while let Some(c) = self.peek() {
            self.advance();
            if c == quote {
                if self.peek() == Some(quote) {
                    self.advance();
                } else {
                    return;
                }
            }
        }
    }

    fn skip_line_comment(&mut self) {
        match self.rest().find('\n') {
            Some(end) => self.pos += end,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_block_comment(&mut self) {
        match self.rest()[2..].find("*/") {
            Some(end) => self.pos += end + 4,
            None => self.pos = self.input.len(),
        }
    }

    /// What starts at the cursor.
    fn token(&self) -> Option<Token> {
        let c = self.peek()?;
        Some(match (c, self.peek_next()) {
            ('\'' | '"', _) => Token::Quote(c),
            ('-', Some('-')) => Token::LineComment,
            ('/', Some('*')) => Token::BlockComment,
            _ => Token::Code,
        })
    }
}

enum Token {
    Quote(char),
    LineComment,
    BlockComment,
    Code,
}

fn push_statement(out: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        out.push(text.to_string());
    }
}

/// Splits a script on `delimiter`, ignoring delimiters inside quotes and
/// comments. Statements are trimmed and empty ones dropped.
///
/// A word delimiter such as `GO`, or `/`, only counts when it stands alone
/// on its line; any other delimiter (typically `;`) counts anywhere.
///
/// ```rust
/// use oxide_etl_core::sql_utils::split_statements;
///
/// let parts = split_statements("insert into t values ('a;b');\n-- x;\nselect 1;", ";");
/// assert_eq!(parts, vec!["insert into t values ('a;b')", "-- x;\nselect 1"]);
/// ```
#[must_use]
pub fn split_statements(sql: &str, delimiter: &str) -> Vec<String> {
    let mut out = Vec::new();
    if delimiter.is_empty() {
        push_statement(&mut out, sql);
        return out;
    }
    let line_mode = delimiter == "/" || delimiter.chars().all(char::is_alphanumeric);
    let mut scanner = Scanner::new(sql);
    let mut start = 0;

    while let Some(token) = scanner.token() {
        match token {
            Token::Quote(q) => scanner.skip_quoted(q),
            Token::LineComment => scanner.skip_line_comment(),
            Token::BlockComment => scanner.skip_block_comment(),
            Token::Code if line_mode => {
                if scanner.at_line_start() {
                    let line_len = scanner.rest().find('\n').unwrap_or(scanner.rest().len());
                    let line = &scanner.rest()[..line_len];
                    if line.trim().eq_ignore_ascii_case(delimiter) {
                        push_statement(&mut out, &sql[start..scanner.pos]);
                        scanner.pos = (scanner.pos + line_len + 1).min(sql.len());
                        start = scanner.pos;
                        continue;
                    }
                }
                scanner.advance();
            }
            Token::Code => {
                if scanner.rest().starts_with(delimiter) {
                    push_statement(&mut out, &sql[start..scanner.pos]);
                    scanner.pos += delimiter.len();
                    start = scanner.pos;
                } else {
                    scanner.advance();
                }
            }
        }
    }
    push_statement(&mut out, &sql[start..]);
    out
}

/// Removes `--` and `/* */` comments outside quoted text.
///
/// Line comments keep their terminating newline. A block comment becomes a
/// single space so adjacent tokens stay apart. Optimizer hints (`/*+ ... */`)
/// are kept.
#[must_use]
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut scanner = Scanner::new(sql);
    while let Some(token) = scanner.token() {
        let start = scanner.pos;
        match token {
            Token::Quote(q) => {
                scanner.skip_quoted(q);
                out.push_str(&sql[start..scanner.pos]);
            }
            Token::LineComment => scanner.skip_line_comment(),
            Token::BlockComment => {
                let hint = scanner.rest().starts_with("/*+");
                scanner.skip_block_comment();
                if hint {
                    out.push_str(&sql[start..scanner.pos]);
                } else if !out.ends_with(char::is_whitespace) && !out.is_empty() {
                    out.push(' ');
                }
            }
            Token::Code => {
                scanner.advance();
                out.push_str(&sql[start..scanner.pos]);
            }
        }
    }
    out
}
