#[path = "property/frequency_rules.rs"]
mod frequency_rules;

#[path = "property/entry_window.rs"]
mod entry_window;

#[path = "property/audit_chain.rs"]
mod audit_chain;
