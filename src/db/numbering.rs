//! Year-scoped sequential numbers for quotes and invoices.
//!
//! `DEV-2026-0007` for a quote, `FAC-2026-0012-A` for an acompte invoice.
//! The sequence restarts every year and is shared by all invoice types.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Devis,
    Facture,
}

impl DocumentKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Devis => "DEV",
            DocumentKind::Facture => "FAC",
        }
    }

    fn table(self) -> &'static str {
        match self {
            DocumentKind::Devis => "devis",
            DocumentKind::Facture => "factures",
        }
    }
}

pub fn format_numero(kind: DocumentKind, year: i32, sequence: u32, suffix: Option<char>) -> String {
    match suffix {
        Some(s) => format!("{}-{year}-{sequence:04}-{s}", kind.prefix()),
        None => format!("{}-{year}-{sequence:04}", kind.prefix()),
    }
}

/// Reserves the next numero for `tenant_id`.
///
/// Must run inside a transaction: the advisory lock is held until commit so
/// two concurrent creations cannot read the same maximum.
pub async fn next_numero(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    kind: DocumentKind,
    year: i32,
    suffix: Option<char>,
) -> Result<String, ApiError> {
    let generation_error = |e: sqlx::Error| ApiError::Generation {
        code: "NUMERO_GENERATION_ERROR",
        message: format!("Impossible de générer le numéro: {e}"),
    };

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("{tenant_id}:{}", kind.prefix()))
        .execute(&mut *conn)
        .await
        .map_err(generation_error)?;

    let pattern = format!("{}-{year}-%", kind.prefix());
    let last: i32 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(MAX(split_part(numero, '-', 3)::INTEGER), 0)
         FROM {table}
         WHERE tenant_id = $1
           AND numero LIKE $2
           AND split_part(numero, '-', 3) ~ '^[0-9]+$'",
        table = kind.table()
    ))
    .bind(tenant_id)
    .bind(pattern)
    .fetch_one(&mut *conn)
    .await
    .map_err(generation_error)?;

    let next = u32::try_from(last).unwrap_or(0) + 1;
    Ok(format_numero(kind, year, next, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_quote_and_invoice_numbers() {
        assert_eq!(format_numero(DocumentKind::Devis, 2026, 7, None), "DEV-2026-0007");
        assert_eq!(
            format_numero(DocumentKind::Facture, 2026, 12, Some('A')),
            "FAC-2026-0012-A"
        );
        assert_eq!(
            format_numero(DocumentKind::Facture, 2026, 12345, Some('S')),
            "FAC-2026-12345-S"
        );
    }
}
