pub mod booking;
pub mod customer;
pub mod delivery;
pub mod money;
pub mod slot;
pub mod technique;
pub mod valentine;

pub use booking::{
    generate_booking_code, Booking, ParticipantAssignment, PaymentDetail, PaymentMethod,
    ProductSnapshot, ProductType, UserInfo,
};
pub use customer::Customer;
pub use delivery::{Delivery, DeliveryStatus};
pub use slot::TimeSlot;
pub use technique::Technique;
pub use valentine::{
    generate_registration_id, RegistrationStatus, ValentineConfig, ValentineRegistration,
    ValentineWorkshop,
};
