use blake3::Hasher;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{AddressFields, FilledForm, FormKind, Page, ProductLineConfig, ProductLineId, WoodColor};

/// The single record a successful submission produces. It is logged and
/// handed back, never stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub id: String,
    pub kind: FormKind,
    pub page: Page,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_line: Option<ProductLineId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<WoodColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressFields>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl RequestRecord {
    /// Assembles the record from validated fields plus the selection. Line and
    /// color are only carried by pages that show the configurator.
    pub fn build(page: Page, form: &FilledForm, line: &ProductLineConfig, color: Option<&WoodColor>) -> Self {
        let contact = form.contact();
        let configured = page.has_configurator();

        let mut record = Self {
            id: String::new(),
            kind: form.kind(),
            page,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            product_line: configured.then(|| line.id.clone()),
            line_display_name: configured.then(|| line.display_name.clone()),
            color: if configured { color.cloned() } else { None },
            message: None,
            city: None,
            address: None,
            attachments: Vec::new(),
        };

        match form {
            FilledForm::Contact(form) => record.message = Some(form.message.clone()),
            FilledForm::Budget(form) => {
                record.message = form.message.clone().filter(|m| !m.trim().is_empty());
                record.address = form.address.clone();
                record.attachments = form.attachments.iter().map(|a| a.file_name.clone()).collect();
            }
            FilledForm::Landing(form) => record.city = Some(form.city.clone()),
            FilledForm::Quote(_) | FilledForm::Lead(_) => {}
        }

        record.id = record.fingerprint();
        record
    }

    /// BLAKE3 over every field but the id.
    fn fingerprint(&self) -> String {
        let mut hasher = Hasher::new();
        let mut field = |value: &str| {
            hasher.update(value.as_bytes());
            hasher.update(&[0]);
        };

        field(self.page.slug());
        field(self.name.as_str());
        field(self.email.as_str());
        field(self.phone.as_str());
        field(self.product_line.as_ref().map_or("", ProductLineId::as_str));
        field(self.color.as_ref().map_or("", |c| c.id.as_str()));
        field(self.message.as_deref().unwrap_or(""));
        field(self.city.as_deref().unwrap_or(""));
        if let Some(address) = &self.address {
            for part in [
                &address.postal_code,
                &address.street,
                &address.number,
                &address.neighborhood,
                &address.city,
                &address.region,
            ] {
                field(part.as_str());
            }
        }
        for name in &self.attachments {
            field(name.as_str());
        }

        hasher.finalize().to_hex().to_string()
    }

    /// The pre-filled chat message for a quote, when a finish was chosen.
    pub fn quote_message(&self) -> Option<String> {
        let line = self.line_display_name.as_deref()?;
        let color = self.color.as_ref()?;
        Some(format!(
            "Olá! Gostaria de um orçamento para a {} na cor {}. Meu nome é {}, e-mail {} e telefone {}.",
            line, color.name, self.name, self.email, self.phone
        ))
    }

    /// `https://wa.me/<phone>?text=<message>`
    pub fn whatsapp_link(&self, phone: &str) -> Option<String> {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        let message = self.quote_message()?;
        Url::parse_with_params(&format!("https://wa.me/{digits}"), &[("text", message)])
            .ok()
            .map(String::from)
    }
}
