use std::path::PathBuf;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::crawl::CrawlConfig;

const DEFAULT_INDEX_URL: &str = "https://www.immo-entre-particuliers.com/annonces/vente?page={page}";

/// Defaults, then `immo.toml` if present, then `IMMO_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub index_url: String,
    pub listing_prefix: String,
    pub pages: u32,
    pub raw_path: PathBuf,
    pub gazetteer_path: PathBuf,
    pub gazetteer_delimiter: String,
    pub output_path: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("index_url", DEFAULT_INDEX_URL)?
            .set_default("listing_prefix", "/annonce-")?
            .set_default("pages", 5i64)?
            .set_default("raw_path", "data/raw.csv")?
            .set_default("gazetteer_path", "data/communes.csv")?
            .set_default("gazetteer_delimiter", ",")?
            .set_default("output_path", "data/dataset.csv")?
            .add_source(File::with_name("immo").required(false))
            .add_source(Environment::with_prefix("IMMO"))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !self.index_url.contains("{page}") {
            bail!("index_url must contain a {{page}} placeholder: {}", self.index_url);
        }
        self.delimiter()?;
        Ok(())
    }

    pub fn delimiter(&self) -> Result<u8> {
        match self.gazetteer_delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => bail!(
                "gazetteer_delimiter must be a single ASCII character, got {:?}",
                self.gazetteer_delimiter
            ),
        }
    }

    pub fn crawl_config(&self, pages: Option<u32>) -> CrawlConfig {
        CrawlConfig {
            index_url: self.index_url.clone(),
            listing_prefix: self.listing_prefix.clone(),
            pages: pages.unwrap_or(self.pages),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            index_url: DEFAULT_INDEX_URL.into(),
            listing_prefix: "/annonce-".into(),
            pages: 5,
            raw_path: "data/raw.csv".into(),
            gazetteer_path: "data/communes.csv".into(),
            gazetteer_delimiter: ";".into(),
            output_path: "data/dataset.csv".into(),
        }
    }

    #[test]
    fn cli_page_count_overrides_setting() {
        let s = settings();
        assert_eq!(s.crawl_config(None).pages, 5);
        assert_eq!(s.crawl_config(Some(2)).pages, 2);
        assert!(s.crawl_config(None).index_page_url(3).ends_with("?page=3"));
    }

    #[test]
    fn delimiter_must_be_one_byte() {
        let mut s = settings();
        assert_eq!(s.delimiter().unwrap(), b';');
        s.gazetteer_delimiter = "\\t".into();
        assert!(s.validate().is_err());
        s.gazetteer_delimiter = ",".into();
        s.index_url = "https://example.com/annonces".into();
        assert!(s.validate().is_err());
    }
}
