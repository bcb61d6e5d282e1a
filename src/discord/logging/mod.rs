// Discord audit logging - renders audit entries and delivers them to the
// configured logging channels.

pub mod audit_log;
pub mod formatter;
