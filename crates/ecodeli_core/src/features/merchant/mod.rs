//! Merchant space: contract summary, plus home-delivery announcements in
//! the `announcements` submodule.
//!
//! # Invariants
//! - The most recently updated contract wins; undated contracts sort last.
//! - An empty contract list is "no contract yet", not an error.

pub mod announcements;

use crate::api::{ApiClient, ApiTransport, FeatureError, PageRequest};
use crate::normalize::format::{format_date_time, parse_timestamp};
use crate::normalize::{
    normalize_enum, pick_first_defined, text_or, AliasTable, IdValue, DASH_PLACEHOLDER,
};
use chrono::{DateTime, FixedOffset};
use log::{error, info};
use serde::{Deserialize, Serialize};

pub const CONTRACTS_ENDPOINT: &str = "/merchants/me/contracts";

const FAILURE_MESSAGE: &str = "Impossible de récupérer votre contrat";
const SUPPORT_EMAIL: &str = "merchant.support@ecodeli.fr";
const SUPPORT_PHONE: &str = "+33 1 78 90 12 34";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantContractDocumentDto {
    pub id: IdValue,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub updated_at: Option<String>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantContractDto {
    pub id: IdValue,
    pub company_name: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
    pub signed_at: Option<String>,
    pub created_at: Option<String>,
    pub pdf_url: Option<String>,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    pub documents: Vec<MerchantContractDocumentDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    UnderReview,
    Active,
    Suspended,
}

const CONTRACT_STATUSES: &AliasTable<ContractStatus> = &[
    ("DRAFT", ContractStatus::Draft),
    ("UNDER_REVIEW", ContractStatus::UnderReview),
    ("ACTIVE", ContractStatus::Active),
    ("SUSPENDED", ContractStatus::Suspended),
];

impl ContractStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, CONTRACT_STATUSES, Self::Draft)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Contrat en préparation",
            Self::UnderReview => "Contrat en cours de validation",
            Self::Active => "Contrat actif",
            Self::Suspended => "Contrat suspendu",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Draft => "Votre contrat est en cours de redaction par nos equipes.",
            Self::UnderReview => {
                "Votre contrat est en cours de verification. Nous revenons vers vous rapidement."
            }
            Self::Active => {
                concat!(
                    "Votre contrat est signe et actif. ",
                    "Vous pouvez creer des annonces de livraison a tout moment."
                )
            }
            Self::Suspended => {
                "Votre contrat est suspendu. Contactez le support pour reactiver votre compte."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractDocumentType {
    Contract,
    Annex,
    Policy,
}

const DOCUMENT_TYPES: &AliasTable<ContractDocumentType> = &[
    ("CONTRACT", ContractDocumentType::Contract),
    ("ANNEX", ContractDocumentType::Annex),
    ("POLICY", ContractDocumentType::Policy),
];

impl ContractDocumentType {
    pub fn parse(raw: Option<&str>) -> Self {
        normalize_enum(raw, DOCUMENT_TYPES, Self::Contract)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Contract => "Contrat",
            Self::Annex => "Annexe",
            Self::Policy => "Politique",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractDocument {
    pub id: String,
    pub label: String,
    pub kind: ContractDocumentType,
    pub updated_at: String,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchantContract {
    pub id: String,
    pub company_name: String,
    pub status: ContractStatus,
    pub status_label: String,
    pub status_description: String,
    pub last_update: String,
    pub pdf_url: Option<String>,
    pub support_email: String,
    pub support_phone: String,
    pub documents: Vec<ContractDocument>,
}

fn last_touched(dto: &MerchantContractDto) -> Option<&str> {
    pick_first_defined(&[
        dto.updated_at.as_deref(),
        dto.signed_at.as_deref(),
        dto.created_at.as_deref(),
    ])
}

pub fn map_contract_document(dto: &MerchantContractDocumentDto) -> ContractDocument {
    ContractDocument {
        id: dto.id.to_string(),
        label: text_or(&[dto.label.as_deref()], "Document contractuel"),
        kind: ContractDocumentType::parse(dto.kind.as_deref()),
        updated_at: format_date_time(dto.updated_at.as_deref()),
        pdf_url: dto.pdf_url.clone(),
    }
}

pub fn map_contract(dto: &MerchantContractDto) -> MerchantContract {
    let status = ContractStatus::parse(dto.status.as_deref());
    MerchantContract {
        id: dto.id.to_string(),
        company_name: text_or(&[dto.company_name.as_deref()], DASH_PLACEHOLDER),
        status,
        status_label: status.label().to_string(),
        status_description: status.description().to_string(),
        last_update: format_date_time(last_touched(dto)),
        pdf_url: dto.pdf_url.clone(),
        support_email: text_or(&[dto.support_email.as_deref()], SUPPORT_EMAIL),
        support_phone: text_or(&[dto.support_phone.as_deref()], SUPPORT_PHONE),
        documents: dto.documents.iter().map(map_contract_document).collect(),
    }
}

/// Most recently updated contract of the list.
pub fn select_current_contract(contracts: &[MerchantContractDto]) -> Option<&MerchantContractDto> {
    let stamp = |dto: &MerchantContractDto| -> Option<DateTime<FixedOffset>> {
        last_touched(dto).and_then(parse_timestamp)
    };
    contracts.iter().reduce(|best, candidate| {
        if stamp(candidate) > stamp(best) {
            candidate
        } else {
            best
        }
    })
}

pub async fn fetch_merchant_contract<T: ApiTransport>(
    client: &ApiClient<T>,
) -> Result<Option<MerchantContract>, FeatureError> {
    let page = match client
        .get_list::<MerchantContractDto>(CONTRACTS_ENDPOINT, &PageRequest::new())
        .await
    {
        Ok(page) => page,
        Err(err) => {
            error!(
                "event=merchant_contract_fetch module=features status=error code={} error={}",
                err.code(),
                err
            );
            return Err(FeatureError::new(FAILURE_MESSAGE, err));
        }
    };
    info!(
        "event=merchant_contract_fetch module=features status=ok contracts={}",
        page.content.len()
    );
    Ok(select_current_contract(&page.content).map(map_contract))
}
