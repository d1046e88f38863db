use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValentineWorkshop {
    TornoSanValentin,
    ModeladoSanValentin,
    PinturaSanValentin,
}

impl ValentineWorkshop {
    pub const ALL: [ValentineWorkshop; 3] = [
        ValentineWorkshop::TornoSanValentin,
        ValentineWorkshop::ModeladoSanValentin,
        ValentineWorkshop::PinturaSanValentin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValentineWorkshop::TornoSanValentin => "torno_san_valentin",
            ValentineWorkshop::ModeladoSanValentin => "modelado_san_valentin",
            ValentineWorkshop::PinturaSanValentin => "pintura_san_valentin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "torno_san_valentin" => Some(ValentineWorkshop::TornoSanValentin),
            "modelado_san_valentin" => Some(ValentineWorkshop::ModeladoSanValentin),
            "pintura_san_valentin" => Some(ValentineWorkshop::PinturaSanValentin),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValentineWorkshop::TornoSanValentin => "Torno en pareja",
            ValentineWorkshop::ModeladoSanValentin => "Modelado en pareja",
            ValentineWorkshop::PinturaSanValentin => "Pintura en pareja",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValentineConfig {
    pub torno: u32,
    pub modelado: u32,
    pub pintura: u32,
}

impl Default for ValentineConfig {
    fn default() -> Self {
        Self {
            torno: 8,
            modelado: 10,
            pintura: 8,
        }
    }
}

impl ValentineConfig {
    pub fn capacity_for(&self, workshop: ValentineWorkshop) -> u32 {
        match workshop {
            ValentineWorkshop::TornoSanValentin => self.torno,
            ValentineWorkshop::ModeladoSanValentin => self.modelado,
            ValentineWorkshop::PinturaSanValentin => self.pintura,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Attended => "attended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RegistrationStatus::Pending),
            "confirmed" => Some(RegistrationStatus::Confirmed),
            "cancelled" => Some(RegistrationStatus::Cancelled),
            "attended" => Some(RegistrationStatus::Attended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValentineRegistration {
    pub id: String,
    pub full_name: String,
    pub birth_date: String,
    pub phone: String,
    pub email: String,
    pub workshop: ValentineWorkshop,
    pub participants: u32,
    pub payment_proof_url: String,
    pub status: RegistrationStatus,
    pub created_at: NaiveDateTime,
}

pub fn generate_registration_id() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("VAL26-{}", &raw[..7])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workshop_parse() {
        assert_eq!(
            ValentineWorkshop::parse("torno_san_valentin"),
            Some(ValentineWorkshop::TornoSanValentin)
        );
        assert_eq!(ValentineWorkshop::parse("torno"), None);
    }

    #[test]
    fn test_default_capacities() {
        let config = ValentineConfig::default();
        assert_eq!(config.capacity_for(ValentineWorkshop::TornoSanValentin), 8);
        assert_eq!(config.capacity_for(ValentineWorkshop::ModeladoSanValentin), 10);
        assert_eq!(config.capacity_for(ValentineWorkshop::PinturaSanValentin), 8);
    }

    #[test]
    fn test_registration_id_format() {
        let id = generate_registration_id();
        assert!(id.starts_with("VAL26-"));
        assert_eq!(id.len(), "VAL26-".len() + 7);
    }

    #[test]
    fn test_status_parse_strict() {
        assert_eq!(RegistrationStatus::parse("confirmed"), Some(RegistrationStatus::Confirmed));
        assert_eq!(RegistrationStatus::parse("paid"), None);
    }
}
