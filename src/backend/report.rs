use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backend::rest_api::iso_date;
use crate::schedule::{ClientId, ProfessionalId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub professional_id: Option<ProfessionalId>,
    pub client_id: Option<ClientId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_cancelled: bool,
}

impl ReportFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];

        if !self.include_cancelled {
            pairs.push(("cancelado".to_string(), "eq.false".to_string()));
        }
        if let Some(id) = self.professional_id {
            pairs.push(("profissional_id".to_string(), format!("eq.{}", id)));
        }
        if let Some(id) = self.client_id {
            pairs.push(("cliente_id".to_string(), format!("eq.{}", id)));
        }
        if let Some(from) = self.from {
            pairs.push(("data".to_string(), format!("gte.{}", iso_date(from))));
        }
        if let Some(to) = self.to {
            pairs.push(("data".to_string(), format!("lte.{}", iso_date(to))));
        }

        pairs.push(("order".to_string(), "data.asc,hora_inicio.asc".to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "agendamento_id")]
    pub appointment_id: i64,
    #[serde(default, rename = "data")]
    pub date: Option<String>,
    #[serde(default, rename = "hora_inicio")]
    pub start_time: Option<String>,
    #[serde(default, rename = "hora_fim")]
    pub end_time: Option<String>,
    #[serde(default, rename = "titulo")]
    pub title: Option<String>,
    #[serde(default, rename = "descricao")]
    pub description: Option<String>,
    #[serde(default, rename = "cancelado")]
    pub cancelled: Option<bool>,
    #[serde(default, rename = "cancelado_as")]
    pub cancelled_at: Option<String>,
    #[serde(default, rename = "cor")]
    pub color: Option<String>,
    #[serde(default, rename = "cliente_id")]
    pub client_id: Option<ClientId>,
    #[serde(default, rename = "nome_cliente")]
    pub client_name: Option<String>,
    #[serde(default, rename = "profissional_id")]
    pub professional_id: Option<ProfessionalId>,
    #[serde(default, rename = "nome_profissional")]
    pub professional_name: Option<String>,
    #[serde(default, rename = "especialidade")]
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub cancelled: usize,
    pub unique_clients: usize,
    pub per_professional: BTreeMap<String, usize>,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut per_professional = BTreeMap::new();
        let mut clients = HashSet::new();
        let mut cancelled = 0;

        for row in rows {
            if row.cancelled.unwrap_or(false) {
                cancelled += 1;
            }
            if let Some(client) = row.client_id {
                clients.insert(client);
            }
            let name = row
                .professional_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "N/A".to_string());
            *per_professional.entry(name).or_insert(0) += 1;
        }

        Self {
            total: rows.len(),
            cancelled,
            unique_clients: clients.len(),
            per_professional,
        }
    }
}
