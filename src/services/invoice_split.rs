//! Splitting a quote into acompte / intermédiaire / solde invoices.
//!
//! Everything here is pure so the money rules can be tested without a
//! database. Amounts are rounded to the cent after every step.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        condition::ConditionPaiement,
        devis::{Devis, LigneDevis},
        facture::{Facture, InvoiceType},
    },
};

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Amounts {
    pub ht: Decimal,
    pub tva: Decimal,
    pub ttc: Decimal,
}

impl Amounts {
    pub fn of_devis(devis: &Devis) -> Self {
        Self {
            ht: devis.montant_ht,
            tva: devis.montant_tva,
            ttc: devis.montant_ttc,
        }
    }

    pub fn of_facture(facture: &Facture) -> Self {
        Self {
            ht: facture.montant_ht,
            tva: facture.montant_tva,
            ttc: facture.montant_ttc,
        }
    }

    /// `pct` percent of `self`. TVA is derived so that HT + TVA = TTC.
    pub fn share(&self, pct: Decimal) -> Self {
        let ht = round2(self.ht * pct / Decimal::ONE_HUNDRED);
        let ttc = round2(self.ttc * pct / Decimal::ONE_HUNDRED);
        Self {
            ht,
            tva: round2(ttc - ht),
            ttc,
        }
    }

    pub fn minus(&self, other: &Amounts) -> Self {
        Self {
            ht: round2(self.ht - other.ht),
            tva: round2(self.tva - other.tva),
            ttc: round2(self.ttc - other.ttc),
        }
    }
}

/// What the invoice-from-quote workflow is about to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePlan {
    pub kind: InvoiceType,
    /// `None` for the solde, which is computed by difference.
    pub percentage: Option<Decimal>,
    pub amounts: Amounts,
    pub date_emission: NaiveDate,
    pub date_echeance: NaiveDate,
}

/// Checks the business preconditions and computes the header amounts of the
/// `kind` invoice for `devis`, given the invoices already issued for it.
pub fn plan_invoice(
    devis: &Devis,
    template: &ConditionPaiement,
    kind: InvoiceType,
    prior: &[Facture],
    date_emission: NaiveDate,
) -> Result<InvoicePlan, ApiError> {
    let percentage = template.percentage(kind).ok_or_else(|| {
        ApiError::rule(
            "INVALID_TYPE",
            format!(
                "Le modèle « {} » ne prévoit pas de facture de type {}",
                template.nom,
                kind.as_str()
            ),
        )
    })?;

    let existing: Vec<InvoiceType> = InvoiceType::SEQUENCE
        .into_iter()
        .filter(|t| prior.iter().any(|f| f.type_facture == *t))
        .collect();
    if existing.contains(&kind) {
        return Err(already_exists(kind, &existing, suggest_next_type(&existing, template)));
    }

    let total = Amounts::of_devis(devis);
    if total.ttc <= Decimal::ZERO {
        return Err(ApiError::rule(
            "INVALID_DEVIS",
            format!("Le devis {} n'a aucun montant à facturer", devis.numero),
        ));
    }

    let (percentage, amounts) = match kind {
        InvoiceType::Solde => {
            let invoiced: Vec<Amounts> = prior.iter().map(Amounts::of_facture).collect();
            let amounts = remaining(total, &invoiced);
            if amounts.ttc <= Decimal::ZERO {
                return Err(ApiError::rule(
                    "INVALID_DEVIS",
                    format!("Le devis {} est déjà entièrement facturé", devis.numero),
                ));
            }
            (None, amounts)
        }
        _ => (Some(percentage), total.share(percentage)),
    };

    let date_echeance = date_emission
        .checked_add_signed(Duration::days(template.delay_days(kind)))
        .ok_or_else(|| {
            ApiError::validation(format!("date_emission hors limites : {date_emission}"))
        })?;

    Ok(InvoicePlan {
        kind,
        percentage,
        amounts,
        date_emission,
        date_echeance,
    })
}

/// Quote total minus everything already invoiced. Independent of the order
/// of `invoiced`.
pub fn remaining(total: Amounts, invoiced: &[Amounts]) -> Amounts {
    invoiced.iter().fold(total, |acc, a| acc.minus(a))
}

/// First slice, in billing order, that is not invoiced yet and that the
/// template actually provides for.
pub fn suggest_next_type(
    existing: &[InvoiceType],
    template: &ConditionPaiement,
) -> Option<InvoiceType> {
    InvoiceType::SEQUENCE
        .into_iter()
        .find(|t| !existing.contains(t) && template.percentage(*t).is_some())
}

pub fn already_exists(
    kind: InvoiceType,
    existing: &[InvoiceType],
    suggested: Option<InvoiceType>,
) -> ApiError {
    let message = match suggested {
        Some(next) => format!(
            "Une facture de type {} existe déjà pour ce devis. Type suivant possible : {}",
            kind.as_str(),
            next.as_str()
        ),
        None => format!(
            "Une facture de type {} existe déjà pour ce devis",
            kind.as_str()
        ),
    };
    ApiError::AlreadyExists {
        message,
        details: Some(json!({
            "existing_types": existing,
            "suggested_type": suggested,
        })),
    }
}

/// Invoice line about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDraft {
    pub ligne_devis_id: Option<Uuid>,
    pub ordre: i32,
    pub designation: String,
    pub quantite: Decimal,
    pub unite: String,
    pub prix_unitaire_ht: Decimal,
    pub tva_pct: Decimal,
}

/// Acompte / intermédiaire lines: `pct` percent of each quote line's HT,
/// billed as a lump sum. The rounding remainder goes on the last line so the
/// lines add up to `header_ht`.
pub fn proportional_lines(lines: &[LigneDevis], pct: Decimal, header_ht: Decimal) -> Vec<LineDraft> {
    let pct_label = pct.normalize();
    let drafts = lines
        .iter()
        .zip(1..)
        .map(|(line, ordre)| LineDraft {
            ligne_devis_id: Some(line.id),
            ordre,
            designation: format!("{} ({pct_label} %)", line.designation),
            quantite: Decimal::ONE,
            unite: FORFAIT.into(),
            prix_unitaire_ht: round2(line.total_ht * pct / Decimal::ONE_HUNDRED),
            tva_pct: line.tva_pct,
        })
        .collect();
    balance_to(drafts, header_ht)
}

/// Solde lines: what is left of each quote line once the HT already invoiced
/// against it is netted out. Fully invoiced lines are dropped. Like
/// [`proportional_lines`], the lines add up to `header_ht`.
pub fn solde_lines(
    lines: &[LigneDevis],
    invoiced_ht: &HashMap<Uuid, Decimal>,
    header_ht: Decimal,
) -> Vec<LineDraft> {
    let drafts = lines
        .iter()
        .filter_map(|line| {
            let already = invoiced_ht.get(&line.id).copied().unwrap_or_default();
            let left = round2(line.total_ht - already);
            (left > Decimal::ZERO).then(|| (line, left))
        })
        .zip(1..)
        .map(|((line, left), ordre)| LineDraft {
            ligne_devis_id: Some(line.id),
            ordre,
            designation: format!("{} (solde)", line.designation),
            quantite: Decimal::ONE,
            unite: FORFAIT.into(),
            prix_unitaire_ht: left,
            tva_pct: line.tva_pct,
        })
        .collect();
    balance_to(drafts, header_ht)
}

const FORFAIT: &str = "forfait";

/// Every draft is a quantity of one, so its HT is its unit price.
pub fn drafts_ht(drafts: &[LineDraft]) -> Decimal {
    drafts.iter().map(|d| round2(d.quantite * d.prix_unitaire_ht)).sum()
}

fn balance_to(mut drafts: Vec<LineDraft>, header_ht: Decimal) -> Vec<LineDraft> {
    let gap = round2(header_ht - drafts_ht(&drafts));
    if let Some(last) = drafts.last_mut() {
        last.prix_unitaire_ht = round2(last.prix_unitaire_ht + gap);
    }
    drafts
}
