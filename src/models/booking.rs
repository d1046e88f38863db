use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::lenient_decimal;
use super::{Technique, TimeSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    SingleClass,
    ClassPackage,
    IntroductoryClass,
    GroupClass,
    OpenStudioSubscription,
    CouplesExperience,
    CustomGroupExperience,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::SingleClass => "SINGLE_CLASS",
            ProductType::ClassPackage => "CLASS_PACKAGE",
            ProductType::IntroductoryClass => "INTRODUCTORY_CLASS",
            ProductType::GroupClass => "GROUP_CLASS",
            ProductType::OpenStudioSubscription => "OPEN_STUDIO_SUBSCRIPTION",
            ProductType::CouplesExperience => "COUPLES_EXPERIENCE",
            ProductType::CustomGroupExperience => "CUSTOM_GROUP_EXPERIENCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SINGLE_CLASS" => Some(ProductType::SingleClass),
            "CLASS_PACKAGE" => Some(ProductType::ClassPackage),
            "INTRODUCTORY_CLASS" => Some(ProductType::IntroductoryClass),
            "GROUP_CLASS" => Some(ProductType::GroupClass),
            "OPEN_STUDIO_SUBSCRIPTION" => Some(ProductType::OpenStudioSubscription),
            "COUPLES_EXPERIENCE" => Some(ProductType::CouplesExperience),
            "CUSTOM_GROUP_EXPERIENCE" => Some(ProductType::CustomGroupExperience),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(
            self,
            ProductType::GroupClass | ProductType::CustomGroupExperience
        )
    }
}

// Immutable copy of the product at purchase time. The catalog can change
// prices and names later; the booking keeps the terms it was sold under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub technique: Option<Technique>,
    #[serde(default)]
    pub sessions: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Giftcard,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Transfer => "Transfer",
            PaymentMethod::Giftcard => "Giftcard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Cash" => Some(PaymentMethod::Cash),
            "Card" => Some(PaymentMethod::Card),
            "Transfer" => Some(PaymentMethod::Transfer),
            "Giftcard" => Some(PaymentMethod::Giftcard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    #[serde(deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub received_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giftcard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giftcard_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAssignment {
    pub participant_number: u32,
    pub technique: Technique,
    #[serde(default)]
    pub selected_piece_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub booking_code: String,
    pub product_type: ProductType,
    pub product: ProductSnapshot,
    pub user_info: UserInfo,
    pub slots: Vec<TimeSlot>,
    pub participants: u32,
    pub price: Decimal,
    pub is_paid: bool,
    #[serde(default)]
    pub payment_details: Vec<PaymentDetail>,
    #[serde(default)]
    pub group_assignments: Option<Vec<ParticipantAssignment>>,
    #[serde(default)]
    pub booking_date: Option<String>,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub client_note: Option<String>,
    #[serde(default)]
    pub accepted_no_refund: bool,
    pub created_at: NaiveDateTime,
}

pub fn generate_booking_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("C-ALMA-{}", &raw[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_wire_form() {
        let json = serde_json::to_string(&ProductType::GroupClass).unwrap();
        assert_eq!(json, r#""GROUP_CLASS""#);
        assert_eq!(ProductType::parse("COUPLES_EXPERIENCE"), Some(ProductType::CouplesExperience));
        assert_eq!(ProductType::parse("WORKSHOP"), None);
    }

    #[test]
    fn test_is_group() {
        assert!(ProductType::GroupClass.is_group());
        assert!(ProductType::CustomGroupExperience.is_group());
        assert!(!ProductType::SingleClass.is_group());
        assert!(!ProductType::CouplesExperience.is_group());
    }

    #[test]
    fn test_payment_detail_amount_coercion() {
        let p: PaymentDetail =
            serde_json::from_str(r#"{"amount":"60","method":"Cash"}"#).unwrap();
        assert_eq!(p.amount, Decimal::from(60));

        let p: PaymentDetail =
            serde_json::from_str(r#"{"amount":null,"method":"Card"}"#).unwrap();
        assert_eq!(p.amount, Decimal::ZERO);
    }

    #[test]
    fn test_booking_code_format() {
        let code = generate_booking_code();
        assert!(code.starts_with("C-ALMA-"));
        assert_eq!(code.len(), "C-ALMA-".len() + 8);
        assert!(code["C-ALMA-".len()..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
