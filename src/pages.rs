use serde::{Deserialize, Serialize};

use crate::{Bonus, FormKind, ProductLineConfig};

pub const GUIDE_TITLE: &str = "Bônus Exclusivo: Erros que Economizam Milhares";
pub const GUIDE_DESCRIPTION: &str = "Guia completo com os erros mais comuns em projetos de esquadrias e como evitá-los para economizar até 40% em custos de retrabalho e manutenção.";
pub const GUIDE_SENT: &str = "Guia enviado para seu e-mail!";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    #[serde(rename = "home")]
    Home,
    #[serde(rename = "sobre")]
    About,
    #[serde(rename = "projetos")]
    Projects,
    #[serde(rename = "contato")]
    Contact,
    #[serde(rename = "orcamento-linhas")]
    Budget,
    #[serde(rename = "orcamento")]
    Quote,
    #[serde(rename = "landing")]
    Landing,
    #[serde(rename = "lp-4us")]
    Landing4Us,
    #[serde(rename = "lp-acm")]
    LandingAcm,
    #[serde(rename = "lp-aluminio")]
    LandingAluminio,
    #[serde(rename = "guia-esquadrias")]
    Guide,
    #[serde(rename = "guia-perffeta")]
    GuidePerfetta,
    #[serde(rename = "obrigado")]
    ThankYou,
}

/// Everything the client needs to lay out a page.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PageShell {
    pub page: Page,
    pub route: &'static str,
    pub title: &'static str,
    pub default_line: &'static str,
    pub form: Option<FormKind>,
    pub configurator: bool,
    pub offers_bonus: bool,
}

impl Page {
    pub const ALL: [Page; 13] = [
        Page::Home,
        Page::About,
        Page::Projects,
        Page::Contact,
        Page::Budget,
        Page::Quote,
        Page::Landing,
        Page::Landing4Us,
        Page::LandingAcm,
        Page::LandingAluminio,
        Page::Guide,
        Page::GuidePerfetta,
        Page::ThankYou,
    ];

    pub fn route(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::About => "/sobre",
            Self::Projects => "/projetos",
            Self::Contact => "/contato",
            Self::Budget => "/orcamento-linhas",
            Self::Quote => "/orcamento",
            Self::Landing => "/landing",
            Self::Landing4Us => "/lp-4us",
            Self::LandingAcm => "/lp-acm",
            Self::LandingAluminio => "/lp-aluminio",
            Self::Guide => "/guia-esquadrias",
            Self::GuidePerfetta => "/guia-perffeta",
            Self::ThankYou => "/obrigado",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Home => "home",
            other => other.route().trim_start_matches('/'),
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.slug() == slug)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Realiza Alumínio",
            Self::About => "Sobre Nós",
            Self::Projects => "Projetos",
            Self::Contact => "Vamos conversar sobre sua obra?",
            Self::Budget => "Solicitar Orçamento",
            Self::Quote => "Seu Orçamento Personalizado",
            Self::Landing | Self::Landing4Us => "Esquadrias de Alto Padrão",
            Self::LandingAcm => "Fachadas em ACM",
            Self::LandingAluminio => "Esquadrias de Alumínio",
            Self::Guide => "Guia: 7 Erros Fatais",
            Self::GuidePerfetta => "Catálogo PERFETTA",
            Self::ThankYou => "Solicitação Recebida!",
        }
    }

    /// Line the configurator starts on when the page mounts.
    pub fn default_line(&self) -> &'static str {
        match self {
            Self::LandingAcm => "acm",
            Self::LandingAluminio => "aluminio",
            _ => "perfetta",
        }
    }

    pub fn form(&self) -> Option<FormKind> {
        match self {
            Self::Contact => Some(FormKind::Contact),
            Self::Budget => Some(FormKind::Budget),
            Self::Quote => Some(FormKind::Quote),
            Self::Landing => Some(FormKind::Landing),
            Self::Landing4Us | Self::LandingAcm | Self::LandingAluminio => Some(FormKind::Lead),
            _ => None,
        }
    }

    /// Pages that show the color selector.
    pub fn has_configurator(&self) -> bool {
        matches!(self, Self::Budget | Self::Quote | Self::Landing | Self::Landing4Us)
    }

    pub fn offers_bonus(&self) -> bool {
        matches!(self, Self::Landing | Self::Landing4Us)
    }

    /// The guide on offer: the line's own bonus first, then the page's.
    pub fn bonus(&self, line: &ProductLineConfig) -> Option<Bonus> {
        line.bonus.clone().or_else(|| {
            self.offers_bonus().then(|| Bonus {
                title: GUIDE_TITLE.to_string(),
                description: GUIDE_DESCRIPTION.to_string(),
            })
        })
    }

    pub fn shell(&self) -> PageShell {
        PageShell {
            page: *self,
            route: self.route(),
            title: self.title(),
            default_line: self.default_line(),
            form: self.form(),
            configurator: self.has_configurator(),
            offers_bonus: self.offers_bonus(),
        }
    }
}
