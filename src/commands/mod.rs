mod completions;
mod doctor;
mod profile;
mod send;
mod serve;

pub use completions::cmd_completions;
pub use doctor::cmd_doctor;
pub use profile::{
    cmd_add, cmd_delete, cmd_get, cmd_list, cmd_update, parse_key_pairs, redact_key,
    redacted, ProfileFields,
};
pub use send::cmd_send;
pub use serve::cmd_serve;
pub use test::{cmd_test, print_validation_result};
