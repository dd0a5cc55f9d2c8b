use serde::Serialize;
use thiserror::Error;

/// Erreur de validation d'un champ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Erreurs liées aux numéros de référence bancaires (IBAN, référence QR,
/// référence créancier ISO 11649)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("IBAN invalide : {0}")]
    InvalidIban(String),

    #[error("le compte {0} n'est pas un QR-IBAN")]
    NotQrIban(String),

    #[error("la référence client ne contient aucun chiffre")]
    EmptyCustomerReference,

    #[error("référence QR invalide : {0}")]
    InvalidQrReference(String),

    #[error("référence créancier ISO 11649 invalide : {0}")]
    InvalidCreditorReference(String),

    #[error("type de référence {reference_type} incompatible avec le compte {account}")]
    IncompatibleReference {
        reference_type: String,
        account: String,
    },
}

/// Erreur du backend de rendu externe. Jamais retentée ici : la politique
/// de reprise appartient à l'appelant.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("échec du backend de rendu : {0}")]
    Backend(String),

    #[error("délai du backend de rendu dépassé ({0} s)")]
    Timeout(u64),
}

/// Erreur de génération, étiquetée par l'étape du pipeline en échec
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("validation échouée : {} erreur(s) de champ", .0.len())]
    Validation(Vec<FieldError>),

    #[error("référence : {0}")]
    Reference(#[from] ReferenceError),

    #[error("rendu : {0}")]
    Render(#[from] RenderError),
}
