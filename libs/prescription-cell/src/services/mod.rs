pub mod prescription;
pub mod roster;

pub use prescription::PrescriptionService;
pub use roster::PatientRosterService;
