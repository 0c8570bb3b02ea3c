mod list;
mod registrable;

pub use list::{normalize_domain, read_domain_list, select_domains, SchemePolicy, ALL_DOMAINS};
pub use registrable::{
    record_name_for, registrable_domain, resolve_target, DomainError, Target, APEX,
};
