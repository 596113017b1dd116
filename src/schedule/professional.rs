use serde::{Deserialize, Serialize};

use super::appointment::ProfessionalId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Professional {
    #[serde(rename = "profissional_id")]
    pub id: ProfessionalId,
    #[serde(default, rename = "perfil_id")]
    pub profile_id: Option<i64>,
    #[serde(default, rename = "especialidade_id")]
    pub specialty_id: Option<i64>,
    #[serde(default, rename = "nome_profissional")]
    pub name: String,
    #[serde(default, rename = "especialidade")]
    pub specialty: Option<String>,
}

impl Professional {
    pub fn label(&self) -> String {
        match self.specialty.as_deref().filter(|s| !s.is_empty()) {
            Some(specialty) => format!("{} ({})", self.name, specialty),
            None => self.name.clone(),
        }
    }
}
