use std::fmt;
use std::str::FromStr;

/// A lowercase, dot-joined domain name.
///
/// Values coming off the wire are already bounded by the per-label and
/// overall length checks the codec enforces while decoding, so
/// [`Name::from_wire`] is infallible. Names built from configuration, CLI
/// input or a CNAME target still need validating, hence [`Name::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum NameError {
    #[error("name exceeds 255 octets")]
    TooLong,
    #[error("label exceeds 63 octets")]
    LabelTooLong,
    #[error("name contains an empty label")]
    EmptyLabel,
}

impl Name {
    pub fn from_wire(value: String) -> Self {
        Name(value.to_lowercase())
    }

    pub fn parse(value: &str) -> Result<Self, NameError> {
        let trimmed = value.trim_end_matches('.');
        if trimmed.is_empty() {
            return Ok(Name(String::new()));
        }
        let mut total = 0usize;
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > 63 {
                return Err(NameError::LabelTooLong);
            }
            total += label.len() + 1;
        }
        if total > 255 {
            return Err(NameError::TooLong);
        }
        Ok(Name(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True when `self` equals `suffix` or is a strict subdomain of it.
    pub fn matches_suffix(&self, suffix: &Name) -> bool {
        if self.0 == suffix.0 {
            return true;
        }
        self.0.ends_with(&format!(".{}", suffix.0))
    }

    /// Reversed label order (`"a.b.c"` -> `"c.b.a"`), used as a sort key so
    /// suffix matches can be found with a prefix scan.
    pub fn reversed_key(&self) -> String {
        let mut labels: Vec<&str> = self.0.split('.').collect();
        labels.reverse();
        labels.join(".")
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::parse(s)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
