//! Bibliothèque de génération de QR-factures suisses : bulletin de
//! versement QR (charge utile SPC, sommes de contrôle IBAN et référence
//! QR) et mise en page paginée du document de facture.
//!
//! Le cœur est un pipeline pur : l'appelant fournit un enregistrement de
//! paiement et une facture déjà peuplés, et reçoit la charge utile validée
//! et/ou le document rendu par le backend injecté. Persistance,
//! authentification, transport HTTP et rastérisation restent hors de ce
//! périmètre.

pub mod document;
pub mod models;
pub mod qrbill;

pub use document::{DocumentGenerator, DocumentLayout, PageOptions, RenderBackend};
pub use models::{
    Address, Currency, FieldError, GenerationError, InvoiceDocument, LineItem,
    PaymentRecord, ReferenceType,
};
pub use qrbill::{labels, LabelSet, Language, LayoutNode};
