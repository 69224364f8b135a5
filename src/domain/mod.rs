pub mod donation;

pub use donation::{
    generate_reference, is_valid_email, Donation, DonationType, NewDonation, PaymentMethod,
    PaymentStatus, DEFAULT_CURRENCY,
};
