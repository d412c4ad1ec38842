use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rdv {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub titre: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub adresse: Option<String>,
    pub notes: Option<String>,
    pub statut: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_rdv_period"))]
pub struct CreateRdvRequest {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub titre: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub adresse: Option<String>,
    pub notes: Option<String>,
}

fn validate_rdv_period(req: &CreateRdvRequest) -> Result<(), ValidationError> {
    if req.date_fin > req.date_debut {
        Ok(())
    } else {
        Err(ValidationError::new("date_fin_before_date_debut"))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_list_period"))]
pub struct ListRdvRequest {
    pub tenant_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub client_id: Option<Uuid>,
}

fn validate_list_period(req: &ListRdvRequest) -> Result<(), ValidationError> {
    if req.to > req.from {
        Ok(())
    } else {
        Err(ValidationError::new("to_before_from"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_rdv_ending_before_it_starts() {
        let start = Utc::now();
        let mut req = CreateRdvRequest {
            tenant_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            titre: "Métré salle de bain".into(),
            date_debut: start,
            date_fin: start - Duration::hours(1),
            adresse: None,
            notes: None,
        };
        assert!(req.validate().is_err());

        req.date_fin = start + Duration::hours(1);
        assert!(req.validate().is_ok());
    }
}
