pub mod bill_payment;

pub use bill_payment::{BillPaymentService, Purchase};
