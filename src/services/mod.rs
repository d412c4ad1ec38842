pub mod assistant;
pub mod clients;
pub mod conditions;
pub mod devis;
pub mod email;
pub mod factures;
pub mod invoice_split;
pub mod metrics;
pub mod rdv;
pub mod relances;
pub mod reminder_scheduler;
pub mod tenants;
