mod policy;
mod policy_type;

pub use policy::{PolicyApi, PolicyDb};
pub use policy_type::{PolicyTypeApi, PolicyTypeDb};

fn default_enabled() -> bool {
    true
}
