use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AddressFields, FieldError, FieldGuard, ProductLineConfig, WoodColor};

pub const MAX_ATTACHMENTS: usize = 5;
pub const THANK_YOU_ROUTE: &str = "/obrigado";

pub const NAME_REQUIRED: &str = "Nome é obrigatório";
pub const EMAIL_INVALID: &str = "E-mail inválido";
pub const PHONE_INVALID: &str = "Telefone inválido";
pub const MESSAGE_TOO_SHORT: &str = "Mensagem muito curta";
pub const CITY_REQUIRED: &str = "Cidade é obrigatória";
pub const LINE_REQUIRED: &str = "Selecione uma linha";
pub const COLOR_REQUIRED: &str = "Selecione uma cor";
pub const POSTAL_CODE_INVALID: &str = "CEP inválido";
pub const STREET_REQUIRED: &str = "Endereço é obrigatório";
pub const TOO_MANY_FILES: &str = "Máximo de 5 arquivos";
pub const FILE_TOO_LARGE: &str = "Arquivo muito grande";
pub const FILE_NAME_REQUIRED: &str = "Arquivo sem nome";

/// Limits that come from configuration rather than the form itself.
#[derive(Debug, Clone, Copy)]
pub struct FormRules {
    pub max_attachment_bytes: u64,
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            max_attachment_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactFields {
    fn check(&self, guard: &mut FieldGuard) {
        guard
            .min_chars("name", &self.name, 2, NAME_REQUIRED)
            .email("email", &self.email, EMAIL_INVALID)
            .min_chars("phone", &self.phone, 10, PHONE_INVALID);
    }
}

/// Metadata of an uploaded file. The upload itself never reaches us.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub size_bytes: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ContactForm {
    #[serde(flatten)]
    pub contact: ContactFields,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BudgetForm {
    #[serde(flatten)]
    pub contact: ContactFields,
    pub product_line: String,
    pub message: Option<String>,
    pub address: Option<AddressFields>,
    pub attachments: Vec<Attachment>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct QuoteForm {
    #[serde(flatten)]
    pub contact: ContactFields,
    pub product_line: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LandingForm {
    #[serde(flatten)]
    pub contact: ContactFields,
    pub city: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LeadForm {
    #[serde(flatten)]
    pub contact: ContactFields,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Budget,
    Quote,
    Landing,
    Lead,
}

impl FormKind {
    /// Whether submitting is blocked until a finish is picked.
    pub fn needs_color(&self) -> bool {
        matches!(self, Self::Budget | Self::Quote)
    }

    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Contact | Self::Budget => None,
            Self::Quote | Self::Landing | Self::Lead => Some(THANK_YOU_ROUTE),
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Contact => "Mensagem enviada com sucesso! Entraremos em contato em breve.",
            Self::Budget => "Orçamento enviado com sucesso! Entraremos em contato em breve.",
            Self::Landing => "Solicitação recebida com sucesso!",
            Self::Quote | Self::Lead => "Solicitação recebida! Entraremos em contato em breve.",
        }
    }

    /// Reads the submitted fields into this kind's typed form. Missing fields
    /// become empty strings and are caught by validation.
    pub fn parse(&self, body: Value) -> Result<FilledForm, serde_json::Error> {
        Ok(match self {
            Self::Contact => FilledForm::Contact(serde_json::from_value(body)?),
            Self::Budget => FilledForm::Budget(serde_json::from_value(body)?),
            Self::Quote => FilledForm::Quote(serde_json::from_value(body)?),
            Self::Landing => FilledForm::Landing(serde_json::from_value(body)?),
            Self::Lead => FilledForm::Lead(serde_json::from_value(body)?),
        })
    }
}

/// A submitted form of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilledForm {
    Contact(ContactForm),
    Budget(BudgetForm),
    Quote(QuoteForm),
    Landing(LandingForm),
    Lead(LeadForm),
}

impl FilledForm {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Contact(_) => FormKind::Contact,
            Self::Budget(_) => FormKind::Budget,
            Self::Quote(_) => FormKind::Quote,
            Self::Landing(_) => FormKind::Landing,
            Self::Lead(_) => FormKind::Lead,
        }
    }

    pub fn contact(&self) -> &ContactFields {
        match self {
            Self::Contact(form) => &form.contact,
            Self::Budget(form) => &form.contact,
            Self::Quote(form) => &form.contact,
            Self::Landing(form) => &form.contact,
            Self::Lead(form) => &form.contact,
        }
    }

    /// Copies the session's line and finish into the fields that mirror them.
    /// Whatever the visitor sent for those fields is discarded.
    pub fn sync_selection(&mut self, line: &ProductLineConfig, color: Option<&WoodColor>) {
        match self {
            Self::Budget(form) => form.product_line = line.id.to_string(),
            Self::Quote(form) => {
                form.product_line = line.id.to_string();
                form.color = color.map(|c| c.name.clone()).unwrap_or_default();
            }
            _ => {}
        }
    }

    pub fn validate(&self, rules: &FormRules) -> Vec<FieldError> {
        let mut guard = FieldGuard::new();
        self.contact().check(&mut guard);

        match self {
            Self::Contact(form) => {
                guard.min_chars("message", &form.message, 10, MESSAGE_TOO_SHORT);
            }
            Self::Budget(form) => {
                guard.min_chars("product_line", &form.product_line, 1, LINE_REQUIRED);
                if let Some(address) = &form.address {
                    guard
                        .digits("address.postal_code", &address.postal_code, 8, POSTAL_CODE_INVALID)
                        .min_chars("address.street", &address.street, 1, STREET_REQUIRED)
                        .min_chars("address.city", &address.city, 2, CITY_REQUIRED);
                }
                guard.check(form.attachments.len() <= MAX_ATTACHMENTS, "attachments", TOO_MANY_FILES);
                for (index, file) in form.attachments.iter().enumerate() {
                    let field = format!("attachments[{index}]");
                    guard
                        .min_chars(&field, &file.file_name, 1, FILE_NAME_REQUIRED)
                        .check(file.size_bytes <= rules.max_attachment_bytes, &field, FILE_TOO_LARGE);
                }
            }
            Self::Quote(form) => {
                guard
                    .min_chars("product_line", &form.product_line, 1, LINE_REQUIRED)
                    .min_chars("color", &form.color, 1, COLOR_REQUIRED);
            }
            Self::Landing(form) => {
                guard.min_chars("city", &form.city, 2, CITY_REQUIRED);
            }
            Self::Lead(_) => {}
        }

        guard.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Catalog;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(form: &FilledForm) -> Vec<String> {
        form.validate(&FormRules::default()).into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn contact_form_flags_bad_email() {
        let form = FormKind::Contact
            .parse(json!({
                "name": "Ana Silva",
                "email": "not-an-email",
                "phone": "11999999999",
                "message": "Quero janelas para a sala"
            }))
            .unwrap();

        assert_eq!(
            form.validate(&FormRules::default()),
            vec![FieldError::new("email", EMAIL_INVALID)]
        );
    }

    #[test]
    fn missing_fields_become_field_errors() {
        let form = FormKind::Landing.parse(json!({})).unwrap();
        assert_eq!(fields(&form), vec!["name", "email", "phone", "city"]);
    }

    #[test]
    fn wrong_types_are_a_parse_error() {
        assert!(FormKind::Lead.parse(json!({ "name": 42 })).is_err());
    }

    #[test]
    fn quote_fields_follow_the_selection() {
        let catalog = Catalog::builtin().unwrap();
        let gold = catalog.lookup("gold").unwrap();
        let mut form = FormKind::Quote
            .parse(json!({
                "name": "Ana Silva",
                "email": "ana@example.com",
                "phone": "11999999999",
                "product_line": "forged",
                "color": "forged"
            }))
            .unwrap();

        form.sync_selection(gold, None);
        assert_eq!(fields(&form), vec!["color"]);

        form.sync_selection(gold, gold.find_color("walnut"));
        let FilledForm::Quote(quote) = &form else { unreachable!() };
        assert_eq!(quote.product_line, "gold");
        assert_eq!(quote.color, "Nogueira");
        assert!(fields(&form).is_empty());
    }

    #[test]
    fn budget_checks_address_and_attachments() {
        let form = FormKind::Budget
            .parse(json!({
                "name": "Ana Silva",
                "email": "ana@example.com",
                "phone": "11999999999",
                "product_line": "perfetta",
                "address": { "postal_code": "1325", "street": "", "city": "Itatiba" },
                "attachments": [
                    { "file_name": "planta.pdf", "size_bytes": 2048 },
                    { "file_name": "fachada.jpg", "size_bytes": 20971520u64 }
                ]
            }))
            .unwrap();

        assert_eq!(
            fields(&form),
            vec!["address.postal_code", "address.street", "attachments[1]"]
        );
    }

    #[test]
    fn budget_limits_attachment_count() {
        let files: Vec<_> = (0..6)
            .map(|i| json!({ "file_name": format!("foto{i}.jpg"), "size_bytes": 10 }))
            .collect();
        let form = FormKind::Budget
            .parse(json!({
                "name": "Ana Silva",
                "email": "ana@example.com",
                "phone": "11999999999",
                "product_line": "perfetta",
                "attachments": files
            }))
            .unwrap();

        assert_eq!(fields(&form), vec!["attachments"]);
    }

    #[test]
    fn kinds_know_their_flow() {
        assert!(FormKind::Budget.needs_color());
        assert!(FormKind::Quote.needs_color());
        assert!(!FormKind::Landing.needs_color());
        assert_eq!(FormKind::Contact.redirect(), None);
        assert_eq!(FormKind::Lead.redirect(), Some(THANK_YOU_ROUTE));
    }
}
