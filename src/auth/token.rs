//! Static bearer token authentication.
//!
//! Token files are CSV with at least three columns: `token,user,uid`, plus an
//! optional quoted, comma separated group list. Later columns are ignored, as
//! are blank lines and lines starting with `#`.

use std::collections::HashMap;
use std::path::Path;

use crate::options::ApplyError;

/// User the loopback client authenticates as.
pub const LOOPBACK_USER: &str = "system:apiserver";

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub uid: String,
    pub groups: Vec<String>,
}

/// Maps bearer tokens to users.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, UserInfo>,
}

impl TokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a static token file.
    pub fn from_file(path: &Path) -> Result<Self, ApplyError> {
        let content = std::fs::read_to_string(path).map_err(|source| ApplyError::TokenFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|(line, reason)| ApplyError::TokenFileFormat {
            path: path.to_path_buf(),
            line,
            reason,
        })
    }

    fn parse(content: &str) -> Result<Self, (usize, String)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(content.as_bytes());

        let mut authenticator = Self::new();
        for result in reader.records() {
            let record = result.map_err(|e| (e.position().map_or(0, line_of), e.to_string()))?;
            let line = record.position().map_or(0, line_of);

            // Whitespace only.
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() < 3 {
                return Err((line, "expected at least token,user,uid".to_string()));
            }

            let (token, name, uid) = (&record[0], &record[1], &record[2]);
            if token.is_empty() || name.is_empty() {
                return Err((line, "token and user must not be empty".to_string()));
            }

            let groups = record
                .get(3)
                .map(|groups| {
                    groups
                        .split(',')
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            if authenticator.tokens.contains_key(token) {
                tracing::warn!(line, "Duplicate token in token file, later entry wins");
            }
            authenticator.add_token(
                token,
                UserInfo {
                    name: name.to_string(),
                    uid: uid.to_string(),
                    groups,
                },
            );
        }

        Ok(authenticator)
    }

    pub fn add_token(&mut self, token: impl Into<String>, user: UserInfo) {
        self.tokens.insert(token.into(), user);
    }

    /// Look up the user a token belongs to.
    pub fn authenticate(&self, token: &str) -> Option<&UserInfo> {
        self.tokens.get(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn line_of(position: &csv::Position) -> usize {
    position.line() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_tokens_and_groups() {
        let content = "\
# comment
abc123,alice,1001,\"admins,devs\"

def456,bob,1002
";
        let auth = TokenAuthenticator::parse(content).unwrap();
        assert_eq!(auth.len(), 2);

        let alice = auth.authenticate("abc123").unwrap();
        assert_eq!(alice.name, "alice");
        assert_eq!(alice.groups, ["admins", "devs"]);

        let bob = auth.authenticate("def456").unwrap();
        assert_eq!(bob.uid, "1002");
        assert!(bob.groups.is_empty());

        assert!(auth.authenticate("nope").is_none());
    }

    #[test]
    fn columns_after_groups_are_ignored() {
        let auth = TokenAuthenticator::parse("tok,alice,1,\"admins,devs\",extra\n").unwrap();
        assert_eq!(auth.authenticate("tok").unwrap().groups, ["admins", "devs"]);
    }

    #[test]
    fn quoted_fields_are_unquoted() {
        let auth = TokenAuthenticator::parse("\"tok\",\"alice\",1\n").unwrap();
        let alice = auth.authenticate("tok").unwrap();
        assert_eq!(alice.name, "alice");
        assert!(alice.groups.is_empty());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let auth = TokenAuthenticator::parse("# tokens\n   \n\nabc,dev,1\n").unwrap();
        assert_eq!(auth.len(), 1);
    }

    #[test]
    fn short_line_reports_line_number() {
        let (line, _) = TokenAuthenticator::parse("ok,user,1\nbroken,user\n").unwrap_err();
        assert_eq!(line, 2);
    }

    #[test]
    fn from_file_reads_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tok,carol,7").unwrap();
        let auth = TokenAuthenticator::from_file(file.path()).unwrap();
        assert_eq!(auth.authenticate("tok").unwrap().name, "carol");
    }

    #[test]
    fn from_file_missing_is_error() {
        let err = TokenAuthenticator::from_file(Path::new("/nonexistent/tokens.csv")).unwrap_err();
        assert!(matches!(err, ApplyError::TokenFile { .. }));
    }
}
