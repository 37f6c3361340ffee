use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// The on-disk shape of a blocklist source file. `EtcHosts` accepts the
/// `0.0.0.0 domain [domain ...]` format most public ad/tracker lists ship;
/// `PlainList` is one domain per line with optional `#` comments.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SourceFormat {
    EtcHosts,
    PlainList,
}

impl SourceFormat {
    fn parse(self, input: &str) -> HashSet<String> {
        match self {
            Self::EtcHosts => parse_hostfile(input),
            Self::PlainList => parse_plain_list(input),
        }
    }
}

fn parse_hostfile(input: &str) -> HashSet<String> {
    input
        .split('\n')
        .flat_map(|line| {
            line.split_whitespace()
                .take_while(|item| !item.starts_with('#'))
                .enumerate()
                .filter_map(|(idx, item)| if idx > 0 { Some(item) } else { None })
                .map(|item| item.to_lowercase())
        })
        .collect()
}

fn parse_plain_list(input: &str) -> HashSet<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_lowercase())
        .collect()
}

fn hash(input: &str) -> String {
    let result = Sha256::new().chain_update(input).finalize();
    base16ct::lower::encode_string(&result)
}

/// A parsed source file, content-hashed so the caller can skip re-importing
/// a list whose content hasn't changed.
#[derive(Debug)]
pub struct BlocklistSource {
    pub hash: String,
    pub entries: HashSet<String>,
}

impl BlocklistSource {
    pub fn from_file(value: &str, format: SourceFormat) -> Self {
        let hash = hash(value);
        let entries = format.parse(value);
        Self { hash, entries }
    }
}

#[derive(Debug, Default)]
pub struct BlocklistLoader;

impl BlocklistLoader {
    pub async fn load(
        &self,
        url: &str,
        format: SourceFormat,
    ) -> Result<BlocklistSource, reqwest::Error> {
        tracing::debug!(url, "fetching blocklist source");
        let req = reqwest::get(url).await?;
        let text = req.text().await?;
        Ok(BlocklistSource::from_file(&text, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADS_TXT: &str = "0.0.0.0 0.r.msn.com\n0.0.0.0 207.net\n# comment\n0.0.0.0 ads.example.com\n";

    #[test]
    fn parse_ads_hostfile() {
        let result = parse_hostfile(ADS_TXT);
        assert!(result.contains("0.r.msn.com"));
        assert!(result.contains("207.net"));
        assert!(!result.contains("#"));
        assert!(!result.contains("0.0.0.0"));
    }

    #[test]
    fn parse_complex_hostfile() {
        let result = BlocklistSource::from_file(
            r#"# nope
0.0.0.0 this.is.blocked
0.0.0.0 this.is.also.blocked blocked.again
0.0.0.0 this.is.also.blocked #Youwon'tgetthis
0.0.0.0 this.is.also.blocked # or this"#,
            SourceFormat::EtcHosts,
        );
        assert!(result.entries.contains("this.is.blocked"));
        assert!(result.entries.contains("this.is.also.blocked"));
        assert!(result.entries.contains("blocked.again"));
        assert!(!result.entries.contains("nope"));
        assert!(!result.entries.contains("youwon'tgetthis"));
        assert!(!result.entries.contains("or"));
        assert!(!result.entries.contains("this"));
    }

    #[test]
    fn parse_plain_list_skips_comments_and_blanks() {
        let result = parse_plain_list("example.com\n\n# comment\nAds.Example.com\n");
        assert!(result.contains("example.com"));
        assert!(result.contains("ads.example.com"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn same_content_yields_same_hash() {
        let a = BlocklistSource::from_file("example.com\n", SourceFormat::PlainList);
        let b = BlocklistSource::from_file("example.com\n", SourceFormat::PlainList);
        assert_eq!(a.hash, b.hash);
    }
}
