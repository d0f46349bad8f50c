pub mod convention;
pub mod projection;
