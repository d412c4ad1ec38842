//! Action names spoken or typed to the assistants, mapped onto API operations.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    CreateClient,
    SearchClient,
    CreateDevis,
    AddLigneDevis,
    GetDevis,
    CreateFactureFromDevis,
    ListFactures,
    UpdateFactureStatut,
    ListConditionsPaiement,
    CreateConditionPaiement,
    ListRelances,
    CreateRdv,
    ListRdv,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::CreateClient,
        Action::SearchClient,
        Action::CreateDevis,
        Action::AddLigneDevis,
        Action::GetDevis,
        Action::CreateFactureFromDevis,
        Action::ListFactures,
        Action::UpdateFactureStatut,
        Action::ListConditionsPaiement,
        Action::CreateConditionPaiement,
        Action::ListRelances,
        Action::CreateRdv,
        Action::ListRdv,
    ];

    /// Path segment of the direct endpoint, also the canonical action name.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Action::CreateClient => "create-client",
            Action::SearchClient => "search-client",
            Action::CreateDevis => "create-devis",
            Action::AddLigneDevis => "add-ligne-devis",
            Action::GetDevis => "get-devis",
            Action::CreateFactureFromDevis => "create-facture-from-devis",
            Action::ListFactures => "list-factures",
            Action::UpdateFactureStatut => "update-facture-statut",
            Action::ListConditionsPaiement => "list-conditions-paiement",
            Action::CreateConditionPaiement => "create-condition-paiement",
            Action::ListRelances => "list-relances",
            Action::CreateRdv => "create-rdv",
            Action::ListRdv => "list-rdv",
        }
    }

    pub fn canonical_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Action::endpoint).collect()
    }

    /// Looks up a raw action name, canonical or synonym, in any casing.
    pub fn resolve(raw: &str) -> Option<Action> {
        let key = normalize(raw);
        if key.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|a| a.endpoint() == key)
            .or_else(|| {
                SYNONYMS
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, action)| *action)
            })
    }
}

/// Synonyms, already in normalized form.
const SYNONYMS: &[(&str, Action)] = &[
    // clients
    ("creer-client", Action::CreateClient),
    ("nouveau-client", Action::CreateClient),
    ("ajouter-client", Action::CreateClient),
    ("new-client", Action::CreateClient),
    ("add-client", Action::CreateClient),
    ("chercher-client", Action::SearchClient),
    ("rechercher-client", Action::SearchClient),
    ("trouver-client", Action::SearchClient),
    ("find-client", Action::SearchClient),
    ("lookup-client", Action::SearchClient),
    // devis
    ("creer-devis", Action::CreateDevis),
    ("nouveau-devis", Action::CreateDevis),
    ("faire-un-devis", Action::CreateDevis),
    ("create-quote", Action::CreateDevis),
    ("new-quote", Action::CreateDevis),
    ("ajouter-ligne", Action::AddLigneDevis),
    ("ajouter-lignes", Action::AddLigneDevis),
    ("ajouter-ligne-devis", Action::AddLigneDevis),
    ("add-lignes-devis", Action::AddLigneDevis),
    ("add-line", Action::AddLigneDevis),
    ("add-lines", Action::AddLigneDevis),
    ("add-quote-lines", Action::AddLigneDevis),
    ("voir-devis", Action::GetDevis),
    ("afficher-devis", Action::GetDevis),
    ("get-quote", Action::GetDevis),
    ("show-quote", Action::GetDevis),
    // factures
    ("creer-facture", Action::CreateFactureFromDevis),
    ("facturer", Action::CreateFactureFromDevis),
    ("facturer-devis", Action::CreateFactureFromDevis),
    ("nouvelle-facture", Action::CreateFactureFromDevis),
    ("create-invoice", Action::CreateFactureFromDevis),
    ("invoice-quote", Action::CreateFactureFromDevis),
    ("liste-factures", Action::ListFactures),
    ("voir-factures", Action::ListFactures),
    ("list-invoices", Action::ListFactures),
    ("changer-statut-facture", Action::UpdateFactureStatut),
    ("marquer-facture", Action::UpdateFactureStatut),
    ("facture-payee", Action::UpdateFactureStatut),
    ("update-invoice-status", Action::UpdateFactureStatut),
    // conditions de paiement
    ("conditions-paiement", Action::ListConditionsPaiement),
    ("liste-conditions-paiement", Action::ListConditionsPaiement),
    ("list-payment-terms", Action::ListConditionsPaiement),
    ("creer-condition-paiement", Action::CreateConditionPaiement),
    ("nouvelle-condition-paiement", Action::CreateConditionPaiement),
    ("create-payment-terms", Action::CreateConditionPaiement),
    // relances
    ("relances", Action::ListRelances),
    ("liste-relances", Action::ListRelances),
    ("voir-relances", Action::ListRelances),
    ("list-reminders", Action::ListRelances),
    // rdv
    ("creer-rdv", Action::CreateRdv),
    ("prendre-rdv", Action::CreateRdv),
    ("nouveau-rdv", Action::CreateRdv),
    ("creer-rendez-vous", Action::CreateRdv),
    ("prendre-rendez-vous", Action::CreateRdv),
    ("book-appointment", Action::CreateRdv),
    ("create-appointment", Action::CreateRdv),
    ("liste-rdv", Action::ListRdv),
    ("agenda", Action::ListRdv),
    ("planning", Action::ListRdv),
    ("list-appointments", Action::ListRdv),
];

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ÿ' => 'y',
        other => other,
    }
}

/// Lowercase, accents folded, `_` and whitespace as `-`, dashes collapsed.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().to_lowercase().chars().map(fold_accent) {
        let c = if c == '_' || c.is_whitespace() { '-' } else { c };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assistant {
    Charlie,
    Leo,
}

impl Assistant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assistant::Charlie => "charlie",
            Assistant::Leo => "leo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_accents_and_separators() {
        assert_eq!(normalize("  Créer_Client "), "creer-client");
        assert_eq!(normalize("Prendre   Rendez-vous"), "prendre-rendez-vous");
        assert_eq!(normalize("--facture__payée--"), "facture-payee");
    }

    #[test]
    fn canonical_names_resolve_to_themselves() {
        for action in Action::ALL {
            assert_eq!(Action::resolve(action.endpoint()), Some(action));
        }
    }

    #[test]
    fn french_and_english_synonyms() {
        assert_eq!(Action::resolve("Ajouter lignes"), Some(Action::AddLigneDevis));
        assert_eq!(Action::resolve("add_lines"), Some(Action::AddLigneDevis));
        assert_eq!(Action::resolve("Facturer"), Some(Action::CreateFactureFromDevis));
        assert_eq!(Action::resolve("create invoice"), Some(Action::CreateFactureFromDevis));
        assert_eq!(Action::resolve("Créer devis"), Some(Action::CreateDevis));
        assert_eq!(Action::resolve("book appointment"), Some(Action::CreateRdv));
    }

    #[test]
    fn unknown_or_blank_actions_do_not_resolve() {
        assert_eq!(Action::resolve("supprimer-tout"), None);
        assert_eq!(Action::resolve("   "), None);
    }

    #[test]
    fn synonyms_are_stored_normalized_and_unique() {
        for (name, _) in SYNONYMS {
            assert_eq!(normalize(name), *name);
            assert!(Action::ALL.iter().all(|a| a.endpoint() != *name), "{name} shadows an endpoint");
        }
        let mut names: Vec<_> = SYNONYMS.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SYNONYMS.len());
    }
}
