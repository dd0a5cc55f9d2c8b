//! Modèles de données du moteur de génération

pub mod address;
pub mod error;
pub mod invoice;
pub mod payment;

pub use address::Address;
pub use error::{FieldError, GenerationError, ReferenceError, RenderError};
pub use invoice::{
    CompanyInfo, Discount, DiscountKind, GlobalDiscount, InvoiceDocument, LineItem,
};
pub use payment::{Currency, PaymentParty, PaymentRecord, ReferenceType};
