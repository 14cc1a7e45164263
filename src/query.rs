use anyhow::{Context, Result};
use clap::ValueEnum;
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Money {
    #[default]
    All,
    In,
    Out,
    Near,
}

impl Money {
    pub fn as_str(self) -> &'static str {
        match self {
            Money::All => "all",
            Money::In => "in",
            Money::Out => "out",
            Money::Near => "near",
        }
    }
}

/// Expiration class filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Expiration {
    Week,
    Stan,
    Quart,
    Cebo,
}

impl Expiration {
    pub fn as_str(self) -> &'static str {
        match self {
            Expiration::Week => "week",
            Expiration::Stan => "stan",
            Expiration::Quart => "quart",
            Expiration::Cebo => "cebo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

/// Option-chain filters. Unset fields never reach the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainQuery {
    pub money: Money,
    pub expir: Option<Expiration>,
    pub excode: Option<String>,
    pub callput: Option<OptionType>,
}

impl ChainQuery {
    /// Present fields in wire order: money, expir, excode, callput.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("money", self.money.as_str().to_string())];
        if let Some(e) = self.expir {
            pairs.push(("expir", e.as_str().to_string()));
        }
        if let Some(code) = self.excode.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            pairs.push(("excode", code.to_lowercase()));
        }
        if let Some(c) = self.callput {
            pairs.push(("callput", c.as_str().to_string()));
        }
        pairs
    }

    /// `{base}/symbol/{ticker}/option-chain?{query}` with the ticker lower-cased.
    pub fn seed_url(&self, base_url: &str, ticker: &str) -> Result<String> {
        let raw = format!(
            "{}/symbol/{}/option-chain",
            base_url.trim_end_matches('/'),
            ticker.trim().to_lowercase()
        );
        let mut url = Url::parse(&raw).with_context(|| format!("Invalid base URL {}", raw))?;
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url.to_string())
    }
}
