//! Address enrichment from Brazilian postal codes (CEP).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::Notice;

pub const POSTAL_CODE_DIGITS: usize = 8;
pub const NOT_FOUND_MESSAGE: &str = "CEP não encontrado";
pub const UNAVAILABLE_MESSAGE: &str = "Não foi possível consultar o CEP";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Postal code must have 8 digits")]
    InvalidCode,
    #[error("Postal code not found")]
    NotFound,
    #[error("Address service returned status {0}")]
    Upstream(u16),
    #[error("Address service violated the lookup contract")]
    Contract,
    #[error("Address service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

impl LookupError {
    /// The non-blocking notice shown to the visitor.
    pub fn notice(&self) -> Notice {
        match self {
            Self::InvalidCode | Self::NotFound => Notice::error(NOT_FOUND_MESSAGE),
            _ => Notice::error(UNAVAILABLE_MESSAGE),
        }
    }
}

/// An 8-digit CEP, stored without separators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Strips separators. Anything that does not leave exactly eight digits
    /// is refused.
    pub fn parse(raw: &str) -> Result<Self, LookupError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let clean = raw.chars().all(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | ' '));
        if !clean || digits.len() != POSTAL_CODE_DIGITS {
            return Err(LookupError::InvalidCode);
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `12345-678`
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl TryFrom<String> for PostalCode {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(value: PostalCode) -> Self {
        value.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// What the address service knows about a postal code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
}

/// Address inputs of a form. All editable by hand.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AddressFields {
    pub postal_code: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
}

impl AddressFields {
    /// Overwrites the looked-up parts, keeping number and anything typed
    /// elsewhere.
    pub fn apply(&mut self, code: &PostalCode, address: Address) {
        self.postal_code = code.formatted();
        self.street = address.street;
        self.neighborhood = address.neighborhood;
        self.city = address.city;
        self.region = address.region;
    }
}

/// The shape a lookup response must have before any field is trusted.
pub fn lookup_contract() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cep": { "type": "string" },
            "logradouro": { "type": "string" },
            "bairro": { "type": "string" },
            "localidade": { "type": "string" },
            "uf": { "type": "string" }
        },
        "required": ["logradouro", "bairro", "localidade", "uf"]
    })
}

#[derive(Deserialize)]
struct ViaCepAddress {
    logradouro: String,
    bairro: String,
    localidade: String,
    uf: String,
}

fn flags_missing(response: &Value) -> bool {
    match response.get("erro") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[derive(Clone)]
pub struct PostalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PostalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, code: &PostalCode) -> String {
        format!("{}/ws/{}/json/", self.base_url, code.as_str())
    }

    pub async fn lookup(&self, code: &PostalCode) -> Result<Address, LookupError> {
        let url = self.endpoint(code);
        debug!(%url, "Looking up postal code");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(code = %code, status = status.as_u16(), "Address service error");
            return Err(LookupError::Upstream(status.as_u16()));
        }
        let body: Value = response.json().await?;

        if flags_missing(&body) {
            return Err(LookupError::NotFound);
        }

        let contract = jsonschema::validator_for(&lookup_contract()).map_err(|e| {
            warn!("Lookup contract does not compile: {}", e);
            LookupError::Contract
        })?;
        if !contract.is_valid(&body) {
            warn!(code = %code, "Address service response violated the contract");
            return Err(LookupError::Contract);
        }

        let found: ViaCepAddress = serde_json::from_value(body).map_err(|_| LookupError::Contract)?;
        Ok(Address {
            street: found.logradouro,
            neighborhood: found.bairro,
            city: found.localidade,
            region: found.uf,
        })
    }

    /// Lookup followed by `apply`. A code the service does not know leaves
    /// `fields` as they were and yields the notice to show; every other
    /// failure is an error.
    pub async fn fill(&self, raw_code: &str, fields: &mut AddressFields) -> Result<Option<Notice>, LookupError> {
        let code = PostalCode::parse(raw_code)?;
        match self.lookup(&code).await {
            Ok(address) => {
                fields.apply(&code, address);
                Ok(None)
            }
            Err(e @ LookupError::NotFound) => {
                debug!(code = %code, "Postal code not found");
                Ok(Some(e.notice()))
            }
            Err(e) => Err(e),
        }
    }
}
