use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{Catalog, FieldError, FormRules, Notice, PageSession, RequestRecord};

pub const MISSING_COLOR_MESSAGE: &str = "Por favor, selecione uma cor";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("This page has no form")]
    NoForm,
    #[error("Malformed form body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("A color must be selected before submitting")]
    MissingColor,
    #[error("A submission is already in flight")]
    InFlight,
}

impl SubmitError {
    pub fn notice(&self) -> Notice {
        match self {
            Self::NoForm => Notice::error("Esta página não possui formulário"),
            Self::Malformed(_) => Notice::error("Não foi possível ler o formulário"),
            Self::Invalid(_) => Notice::error("Verifique os campos destacados"),
            Self::MissingColor => Notice::error(MISSING_COLOR_MESSAGE),
            Self::InFlight => Notice::info("Enviando..."),
        }
    }
}

/// What the visitor gets back from a successful submission.
#[derive(Serialize, Debug, Clone)]
pub struct SubmitOutcome {
    pub record: RequestRecord,
    pub notice: Notice,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_link: Option<String>,
}

/// Receives form submissions. Nothing leaves the process: the record is
/// logged after a simulated network delay.
#[derive(Debug, Clone)]
pub struct SubmissionDesk {
    rules: FormRules,
    delay: Duration,
    whatsapp_phone: Option<String>,
}

impl SubmissionDesk {
    pub fn new(rules: FormRules, delay: Duration, whatsapp_phone: Option<String>) -> Self {
        Self {
            rules,
            delay,
            whatsapp_phone,
        }
    }

    pub fn rules(&self) -> &FormRules {
        &self.rules
    }

    pub async fn submit(
        &self,
        catalog: &Catalog,
        session: &PageSession,
        body: Value,
    ) -> Result<SubmitOutcome, SubmitError> {
        let page = session.page();
        let kind = page.form().ok_or(SubmitError::NoForm)?;
        let mut form = kind.parse(body)?;

        let selection = session.snapshot();
        let line = selection.config(catalog);
        form.sync_selection(line, selection.color());

        let errors = form.validate(&self.rules);
        if !errors.is_empty() {
            debug!(session = session.id(), errors = errors.len(), "Form rejected");
            return Err(SubmitError::Invalid(errors));
        }
        if kind.needs_color() && selection.require_color().is_err() {
            warn!(session = session.id(), line = %line.id, "Submit without a color");
            return Err(SubmitError::MissingColor);
        }

        let _guard = session.begin_submit().ok_or(SubmitError::InFlight)?;
        tokio::time::sleep(self.delay).await;

        let record = RequestRecord::build(page, &form, line, selection.color());
        info!(
            id = %record.id,
            page = page.slug(),
            "Request received: {}",
            serde_json::to_string(&record).unwrap_or_default()
        );

        let whatsapp_link = self
            .whatsapp_phone
            .as_deref()
            .and_then(|phone| record.whatsapp_link(phone));

        Ok(SubmitOutcome {
            notice: Notice::success(kind.success_message()),
            redirect: kind.redirect(),
            whatsapp_link,
            record,
        })
    }
}
