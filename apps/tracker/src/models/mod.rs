pub mod address;
pub mod mail;
pub mod observation;
pub mod record;
