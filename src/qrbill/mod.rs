//! Génération du bulletin QR suisse
//!
//! Ce module couvre la chaîne complète du bulletin :
//! - numéros de référence (IBAN, QR-IBAN, référence QR, ISO 11649)
//! - libellés par langue (de/fr/it/en)
//! - charge utile SPC encodée dans le symbole QR
//! - description de mise en page du bulletin 210 × 105 mm

pub mod labels;
pub mod layout;
pub mod payload;
pub mod reference;

pub use labels::{labels, LabelSet, Language};
pub use layout::{render_slip, FontSpec, LayoutNode, Rect};
