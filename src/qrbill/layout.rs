//! Description de mise en page du bulletin QR.
//!
//! Construit un arbre de nœuds de mise en page (régions nommées, textes
//! positionnés, symbole QR, lignes de perforation) pour le bulletin de
//! 210 × 105 mm : récépissé de 62 mm à gauche, section paiement de 148 mm
//! à droite. Les coordonnées sont en millimètres, relatives à la région
//! parente ; aucune rastérisation n'a lieu ici — l'arbre est remis au
//! backend de rendu injecté.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::labels::LabelSet;
use super::reference::{format_iban, format_qr_reference};
use crate::models::address::Address;
use crate::models::payment::{PaymentRecord, ReferenceType};

/// Dimensions normalisées du bulletin (mm)
pub const SLIP_WIDTH_MM: f64 = 210.0;
pub const SLIP_HEIGHT_MM: f64 = 105.0;
pub const RECEIPT_WIDTH_MM: f64 = 62.0;
pub const PAYMENT_PART_WIDTH_MM: f64 = 148.0;
/// Colonne d'information de la section paiement
pub const INFO_COLUMN_WIDTH_MM: f64 = 95.0;
/// Zone du symbole QR, carrée
pub const QR_SIZE_MM: f64 = 46.0;

const MARGIN_MM: f64 = 5.0;
/// La colonne QR + montant occupe le reste de la section paiement
const QR_COLUMN_WIDTH_MM: f64 = PAYMENT_PART_WIDTH_MM - INFO_COLUMN_WIDTH_MM;

/// Interlignes (mm)
const RECEIPT_LINE_MM: f64 = 3.5;
const PAYMENT_LINE_MM: f64 = 4.0;

/// Polices du récépissé et de la section paiement (pt)
const FONT_SECTION_TITLE: FontSpec = FontSpec { size_pt: 11.0, bold: true };
const FONT_RECEIPT_HEADING: FontSpec = FontSpec { size_pt: 6.0, bold: true };
const FONT_RECEIPT_VALUE: FontSpec = FontSpec { size_pt: 8.0, bold: false };
const FONT_PAYMENT_HEADING: FontSpec = FontSpec { size_pt: 8.0, bold: true };
const FONT_PAYMENT_VALUE: FontSpec = FontSpec { size_pt: 10.0, bold: false };
const FONT_ALTERNATIVE: FontSpec = FontSpec { size_pt: 7.0, bold: false };
const FONT_DRAFT_NOTE: FontSpec = FontSpec { size_pt: 14.0, bold: true };

/// Rectangle en millimètres, origine en haut à gauche de la région parente
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Police d'un nœud texte
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub size_pt: f32,
    pub bold: bool,
}

/// Nœud de l'arbre de mise en page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutNode {
    /// Région nommée ; les enfants sont positionnés relativement à elle
    Region {
        name: String,
        frame: Rect,
        children: Vec<LayoutNode>,
    },
    Text {
        content: String,
        x: f64,
        y: f64,
        font: FontSpec,
    },
    /// Symbole QR portant la charge utile SPC (niveau de correction M)
    QrSymbol { payload: String, frame: Rect },
    /// Ligne de perforation
    DashedLine { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Cadre vide à compléter à la main (montant ou débiteur absent)
    BlankBox { frame: Rect },
}

impl LayoutNode {
    fn region(name: &str, frame: Rect, children: Vec<LayoutNode>) -> Self {
        Self::Region {
            name: name.into(),
            frame,
            children,
        }
    }

    fn text(content: impl Into<String>, x: f64, y: f64, font: FontSpec) -> Self {
        Self::Text {
            content: content.into(),
            x,
            y,
            font,
        }
    }

    /// Parcourt l'arbre et compte les nœuds satisfaisant le prédicat
    pub fn count_matching(&self, predicate: &dyn Fn(&LayoutNode) -> bool) -> usize {
        let own = usize::from(predicate(self));
        match self {
            Self::Region { children, .. } => own
                + children
                    .iter()
                    .map(|child| child.count_matching(predicate))
                    .sum::<usize>(),
            _ => own,
        }
    }
}

/// Construit l'arbre de mise en page du bulletin complet.
///
/// Fonction pure : (enregistrement validé, charge utile, libellés) vers
/// arbre de nœuds. Les blocs créancier / référence / montant / débiteur
/// figurent deux fois, sur le récépissé et sur la section paiement — le
/// standard l'exige, ce n'est pas une redondance à éliminer.
pub fn render_slip(
    record: &PaymentRecord,
    payload: &str,
    labels: &LabelSet,
    draft: bool,
) -> LayoutNode {
    let mut children = vec![
        // Perforations : au-dessus du bulletin et entre les deux parties
        LayoutNode::DashedLine {
            x1: 0.0,
            y1: 0.0,
            x2: SLIP_WIDTH_MM,
            y2: 0.0,
        },
        LayoutNode::DashedLine {
            x1: RECEIPT_WIDTH_MM,
            y1: 0.0,
            x2: RECEIPT_WIDTH_MM,
            y2: SLIP_HEIGHT_MM,
        },
        receipt_part(record, labels),
        payment_part(record, payload, labels),
    ];

    if draft {
        children.push(LayoutNode::text(
            labels.do_not_use_for_payment,
            SLIP_WIDTH_MM / 2.0 - 55.0,
            SLIP_HEIGHT_MM / 2.0,
            FONT_DRAFT_NOTE,
        ));
    }

    LayoutNode::region(
        "qr_bill",
        Rect {
            x: 0.0,
            y: 0.0,
            width: SLIP_WIDTH_MM,
            height: SLIP_HEIGHT_MM,
        },
        children,
    )
}

/// Récépissé, 62 mm à gauche
fn receipt_part(record: &PaymentRecord, labels: &LabelSet) -> LayoutNode {
    let mut children = Vec::new();
    let mut y = 8.0;

    children.push(LayoutNode::text(labels.receipt, MARGIN_MM, y, FONT_SECTION_TITLE));
    y += 9.0;

    // Compte / Payable à
    children.push(LayoutNode::text(
        format!("{} / {}", labels.account, labels.payable_to),
        MARGIN_MM,
        y,
        FONT_RECEIPT_HEADING,
    ));
    y += RECEIPT_LINE_MM;
    children.push(LayoutNode::text(
        format_iban(&record.creditor_account),
        MARGIN_MM,
        y,
        FONT_RECEIPT_VALUE,
    ));
    y += RECEIPT_LINE_MM;
    for line in address_lines(&record.creditor) {
        children.push(LayoutNode::text(line, MARGIN_MM, y, FONT_RECEIPT_VALUE));
        y += RECEIPT_LINE_MM;
    }
    y += 2.0;

    if let Some(reference) = formatted_reference(record) {
        children.push(LayoutNode::text(
            labels.reference,
            MARGIN_MM,
            y,
            FONT_RECEIPT_HEADING,
        ));
        y += RECEIPT_LINE_MM;
        children.push(LayoutNode::text(reference, MARGIN_MM, y, FONT_RECEIPT_VALUE));
        y += RECEIPT_LINE_MM + 2.0;
    }

    // Payable par, ou cadre vide à compléter par le payeur
    children.push(LayoutNode::text(
        labels.payable_by,
        MARGIN_MM,
        y,
        FONT_RECEIPT_HEADING,
    ));
    y += RECEIPT_LINE_MM;
    match &record.debtor {
        Some(debtor) => {
            for line in address_lines(debtor) {
                children.push(LayoutNode::text(line, MARGIN_MM, y, FONT_RECEIPT_VALUE));
                y += RECEIPT_LINE_MM;
            }
        }
        None => {
            children.push(LayoutNode::BlankBox {
                frame: Rect {
                    x: MARGIN_MM,
                    y,
                    width: 52.0,
                    height: 15.0,
                },
            });
        }
    }

    // Monnaie et montant sur une ligne commune
    children.push(LayoutNode::text(labels.currency, MARGIN_MM, 68.0, FONT_RECEIPT_HEADING));
    children.push(LayoutNode::text(labels.amount, 17.0, 68.0, FONT_RECEIPT_HEADING));
    children.push(LayoutNode::text(
        record.currency.code(),
        MARGIN_MM,
        68.0 + RECEIPT_LINE_MM,
        FONT_RECEIPT_VALUE,
    ));
    match record.amount {
        Some(amount) => children.push(LayoutNode::text(
            format_amount_display(amount),
            17.0,
            68.0 + RECEIPT_LINE_MM,
            FONT_RECEIPT_VALUE,
        )),
        None => children.push(LayoutNode::BlankBox {
            frame: Rect {
                x: 27.0,
                y: 68.0,
                width: 30.0,
                height: 10.0,
            },
        }),
    }

    children.push(LayoutNode::text(
        labels.acceptance_point,
        34.0,
        82.0,
        FONT_RECEIPT_HEADING,
    ));

    LayoutNode::region(
        "receipt",
        Rect {
            x: 0.0,
            y: 0.0,
            width: RECEIPT_WIDTH_MM,
            height: SLIP_HEIGHT_MM,
        },
        children,
    )
}

/// Section paiement, 148 mm à droite : colonne QR + montant, puis colonne
/// d'information de 95 mm
fn payment_part(record: &PaymentRecord, payload: &str, labels: &LabelSet) -> LayoutNode {
    let mut children = Vec::new();

    children.push(LayoutNode::text(
        labels.payment_part,
        MARGIN_MM,
        8.0,
        FONT_SECTION_TITLE,
    ));

    children.push(LayoutNode::QrSymbol {
        payload: payload.into(),
        frame: Rect {
            x: MARGIN_MM,
            y: 17.0,
            width: QR_SIZE_MM,
            height: QR_SIZE_MM,
        },
    });

    // Monnaie et montant sous le symbole
    children.push(LayoutNode::text(labels.currency, MARGIN_MM, 71.0, FONT_PAYMENT_HEADING));
    children.push(LayoutNode::text(labels.amount, 18.0, 71.0, FONT_PAYMENT_HEADING));
    children.push(LayoutNode::text(
        record.currency.code(),
        MARGIN_MM,
        71.0 + PAYMENT_LINE_MM,
        FONT_PAYMENT_VALUE,
    ));
    match record.amount {
        Some(amount) => children.push(LayoutNode::text(
            format_amount_display(amount),
            18.0,
            71.0 + PAYMENT_LINE_MM,
            FONT_PAYMENT_VALUE,
        )),
        None => children.push(LayoutNode::BlankBox {
            frame: Rect {
                x: 18.0,
                y: 69.0,
                width: 40.0,
                height: 15.0,
            },
        }),
    }

    children.push(information_column(record, labels));

    // Procédures alternatives au bas de la section
    let mut alt_y = 98.0;
    for procedure in record.alternative_procedures.iter().take(2) {
        children.push(LayoutNode::text(procedure.clone(), MARGIN_MM, alt_y, FONT_ALTERNATIVE));
        alt_y += 3.0;
    }

    LayoutNode::region(
        "payment_part",
        Rect {
            x: RECEIPT_WIDTH_MM,
            y: 0.0,
            width: PAYMENT_PART_WIDTH_MM,
            height: SLIP_HEIGHT_MM,
        },
        children,
    )
}

/// Colonne d'information : créancier, référence, informations
/// supplémentaires, débiteur
fn information_column(record: &PaymentRecord, labels: &LabelSet) -> LayoutNode {
    let mut children = Vec::new();
    let mut y = 8.0;

    children.push(LayoutNode::text(
        format!("{} / {}", labels.account, labels.payable_to),
        0.0,
        y,
        FONT_PAYMENT_HEADING,
    ));
    y += PAYMENT_LINE_MM;
    children.push(LayoutNode::text(
        format_iban(&record.creditor_account),
        0.0,
        y,
        FONT_PAYMENT_VALUE,
    ));
    y += PAYMENT_LINE_MM;
    for line in address_lines(&record.creditor) {
        children.push(LayoutNode::text(line, 0.0, y, FONT_PAYMENT_VALUE));
        y += PAYMENT_LINE_MM;
    }
    y += 2.0;

    if let Some(reference) = formatted_reference(record) {
        children.push(LayoutNode::text(labels.reference, 0.0, y, FONT_PAYMENT_HEADING));
        y += PAYMENT_LINE_MM;
        children.push(LayoutNode::text(reference, 0.0, y, FONT_PAYMENT_VALUE));
        y += PAYMENT_LINE_MM + 2.0;
    }

    let additional: Vec<&str> = [
        record.unstructured_message.as_deref(),
        record.bill_information.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !additional.is_empty() {
        children.push(LayoutNode::text(
            labels.additional_info,
            0.0,
            y,
            FONT_PAYMENT_HEADING,
        ));
        y += PAYMENT_LINE_MM;
        for line in additional {
            children.push(LayoutNode::text(line, 0.0, y, FONT_PAYMENT_VALUE));
            y += PAYMENT_LINE_MM;
        }
        y += 2.0;
    }

    children.push(LayoutNode::text(labels.payable_by, 0.0, y, FONT_PAYMENT_HEADING));
    y += PAYMENT_LINE_MM;
    match &record.debtor {
        Some(debtor) => {
            for line in address_lines(debtor) {
                children.push(LayoutNode::text(line, 0.0, y, FONT_PAYMENT_VALUE));
                y += PAYMENT_LINE_MM;
            }
        }
        None => {
            children.push(LayoutNode::BlankBox {
                frame: Rect {
                    x: 0.0,
                    y,
                    width: 65.0,
                    height: 25.0,
                },
            });
        }
    }

    LayoutNode::region(
        "information",
        Rect {
            x: QR_COLUMN_WIDTH_MM,
            y: 0.0,
            width: INFO_COLUMN_WIDTH_MM,
            height: SLIP_HEIGHT_MM,
        },
        children,
    )
}

/// Lignes d'affichage d'une adresse structurée
fn address_lines(address: &Address) -> Vec<String> {
    let mut lines = vec![address.name.clone(), address.address_line1.clone()];
    if let Some(ref line2) = address.address_line2 {
        if !line2.is_empty() {
            lines.push(line2.clone());
        }
    }
    lines.push(format!("{} {}", address.postal_code, address.city));
    lines
}

/// Référence formatée pour l'affichage, selon son type
fn formatted_reference(record: &PaymentRecord) -> Option<String> {
    let reference = record.reference.as_deref()?;
    match record.reference_type {
        ReferenceType::Qrr => Some(format_qr_reference(reference)),
        ReferenceType::Scor => Some(reference.to_string()),
        ReferenceType::Non => None,
    }
}

/// Montant d'affichage : deux décimales, milliers séparés par une espace
/// (usage suisse : 1 234.56)
pub(crate) fn format_amount_display(amount: Decimal) -> String {
    let plain = format!("{:.2}", amount);
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::new();
    for (position, digit) in digits.iter().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*digit);
    }
    format!("{grouped}.{fraction}")
}
